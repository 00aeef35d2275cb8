//! Round bookkeeping and the externally visible session state.

use std::fmt;

use hexbridge_device::ConnectionState;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// What the bridge looks like from the outside.
///
/// Derived from the link's [`ConnectionState`] plus whether a round is
/// running. `Ready` and `GameActive` are the "known good" states; a
/// transient `Error`/`Connecting` excursion does not make the bridge
/// forget that a round was active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    Ready,
    GameActive,
    Connecting,
    Error,
}

impl SessionState {
    /// Returns `true` for `Ready` and `GameActive`.
    pub fn is_known_good(&self) -> bool {
        matches!(self, Self::Ready | Self::GameActive)
    }
}

impl From<ConnectionState> for SessionState {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Disconnected => Self::Disconnected,
            ConnectionState::Connecting => Self::Connecting,
            ConnectionState::Ready => Self::Ready,
            ConnectionState::Error => Self::Error,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Ready => write!(f, "READY"),
            Self::GameActive => write!(f, "GAME_ACTIVE"),
            Self::Connecting => write!(f, "CONNECTING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// StateTracker
// ---------------------------------------------------------------------------

/// Folds raw state reports into the state that gets published.
#[derive(Debug, Clone)]
pub(crate) struct StateTracker {
    last_known_good: SessionState,
    current: SessionState,
}

impl StateTracker {
    pub(crate) fn new() -> Self {
        Self {
            last_known_good: SessionState::Ready,
            current: SessionState::Disconnected,
        }
    }

    /// Folds a new report and returns the state to publish.
    ///
    /// `Ready` while the last known-good state is `GameActive` means the
    /// link came back under a running round, so `GameActive` is restored.
    pub(crate) fn fold(&mut self, reported: SessionState) -> SessionState {
        let published = if reported == SessionState::Ready
            && self.last_known_good == SessionState::GameActive
        {
            SessionState::GameActive
        } else {
            if reported.is_known_good() {
                self.last_known_good = reported;
            }
            reported
        };
        self.current = published;
        published
    }

    pub(crate) fn on_link_state(&mut self, state: ConnectionState) -> SessionState {
        self.fold(state.into())
    }

    /// The round is over; the next `Ready` must be published as `Ready`.
    pub(crate) fn round_cleared(&mut self) {
        self.last_known_good = SessionState::Ready;
    }

    pub(crate) fn current(&self) -> SessionState {
        self.current
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// What a timer tick asks the controller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Nothing,
    /// Full time announcement with the remaining seconds.
    Announce(i64),
    /// Short countdown announcement.
    AnnounceShort(i64),
    /// Time is up; end the round.
    Expired,
}

/// The round currently being played.
///
/// A negative `remaining_secs` means no round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    /// The only chat user allowed to stop the round.
    pub player: String,
    pub remaining_secs: i64,
    /// Device level, 0–10.
    pub level: u8,
    pub running: bool,
}

impl GameSession {
    pub(crate) fn idle() -> Self {
        Self {
            player: String::new(),
            remaining_secs: -1,
            level: 0,
            running: false,
        }
    }

    pub(crate) fn start(player: String, game_time_secs: i64, level: u8) -> Self {
        Self {
            player,
            remaining_secs: game_time_secs,
            level,
            running: true,
        }
    }

    /// Whether a round is in progress.
    pub fn is_active(&self) -> bool {
        self.running && self.remaining_secs >= 0
    }

    pub(crate) fn clear(&mut self) {
        self.remaining_secs = -1;
        self.running = false;
    }

    /// Advances the round by one second.
    pub(crate) fn tick(&mut self) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Nothing;
        }
        self.remaining_secs -= 1;
        let r = self.remaining_secs;
        if r > 60 {
            if r % 30 == 0 {
                TickOutcome::Announce(r)
            } else {
                TickOutcome::Nothing
            }
        } else if r > 10 {
            if r % 15 == 0 {
                TickOutcome::Announce(r)
            } else {
                TickOutcome::Nothing
            }
        } else if r == 10 {
            TickOutcome::Announce(r)
        } else if r > 0 {
            TickOutcome::AnnounceShort(r)
        } else {
            TickOutcome::Expired
        }
    }
}
