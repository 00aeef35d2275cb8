//! Single-slot buffer for the pending device acknowledgment.

use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::frame::Ack;

const SLOT_CAPACITY: usize = 1;

/// Holds at most one unconsumed acknowledgment.
///
/// The link worker offers into the slot; the requester takes from it. When
/// the slot is still occupied the offer waits for a short while and then
/// drops the new frame, the buffer never grows.
pub(crate) struct ResponseSlot {
    tx: mpsc::Sender<Ack>,
    rx: Mutex<mpsc::Receiver<Ack>>,
}

impl ResponseSlot {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel(SLOT_CAPACITY);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Offers an acknowledgment. Returns `false` if it was dropped.
    pub(crate) async fn offer(&self, ack: Ack, wait: Duration) -> bool {
        self.tx.send_timeout(ack, wait).await.is_ok()
    }

    /// Waits up to `wait` for an acknowledgment.
    pub(crate) async fn take(&self, wait: Duration) -> Option<Ack> {
        let mut rx = self.rx.lock().await;
        tokio::time::timeout(wait, rx.recv()).await.ok().flatten()
    }

    /// Discards a stale acknowledgment, if any.
    pub(crate) async fn clear(&self) -> Option<Ack> {
        self.rx.lock().await.try_recv().ok()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tx.capacity() == SLOT_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn test_offer_then_take() {
        let slot = ResponseSlot::new();
        assert!(slot.is_empty());
        assert!(slot.offer(Ack::decode(b"OK\0"), WAIT).await);
        assert!(!slot.is_empty());
        let ack = slot.take(WAIT).await.unwrap();
        assert_eq!(ack.text(), "OK");
        assert!(slot.is_empty());
    }

    #[tokio::test]
    async fn test_second_offer_is_dropped_when_occupied() {
        let slot = ResponseSlot::new();
        assert!(slot.offer(Ack::decode(b"first"), WAIT).await);
        assert!(!slot.offer(Ack::decode(b"second"), WAIT).await);
        assert_eq!(slot.take(WAIT).await.unwrap().text(), "first");
        assert!(slot.take(WAIT).await.is_none());
    }

    #[tokio::test]
    async fn test_take_times_out_on_empty_slot() {
        let slot = ResponseSlot::new();
        assert!(slot.take(WAIT).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_discards_stale_ack() {
        let slot = ResponseSlot::new();
        slot.offer(Ack::decode(b"stale"), WAIT).await;
        assert_eq!(slot.clear().await.unwrap().text(), "stale");
        assert!(slot.is_empty());
        assert!(slot.clear().await.is_none());
    }
}
