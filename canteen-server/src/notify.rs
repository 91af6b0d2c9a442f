//! Order status push notifications
//!
//! A single broadcast channel fans order events out to every connected
//! SSE subscriber. Publishing is fire-and-forget: an order update never
//! fails because nobody is listening.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Event emitted whenever an order changes status
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub order_number: String,
    pub user_id: String,
    pub canteen_id: String,
    pub status: String,
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<OrderEvent>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: OrderEvent) {
        // Err here only means no subscribers are connected
        let _ = self.tx.send(event);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
