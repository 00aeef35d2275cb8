//! Outbound notifications from the session.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::SessionState;

/// Something the session wants the outside world to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The published session state changed.
    State(SessionState),
    /// A line for the chat audience.
    Announcement(String),
    /// A notice for the operator / control panel.
    Notice(String),
}

/// Receives [`SessionEvent`]s from the session actor.
///
/// `emit` is called from inside the actor loop and must not block.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: SessionEvent);
}

/// Channel sink. Events sent after the receiver is dropped are discarded.
impl EventSink for mpsc::UnboundedSender<SessionEvent> {
    fn emit(&self, event: SessionEvent) {
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_and_ignores_closed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.emit(SessionEvent::Notice("hello".into()));
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::Notice("hello".into()));

        drop(rx);
        tx.emit(SessionEvent::State(SessionState::Ready));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&SessionEvent::State(SessionState::GameActive)).unwrap();
        assert_eq!(json, r#"{"type":"state","data":"GameActive"}"#);
    }
}
