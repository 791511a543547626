use tokio::sync::broadcast;

use super::messages::ServerEvent;

const HUB_CAPACITY: usize = 256;

/// Fans every published frame out to all connected sockets.
///
/// Delivery is best effort: a subscriber that falls more than
/// `HUB_CAPACITY` frames behind skips the oldest ones.
#[derive(Clone)]
pub struct Hub {
    tx: broadcast::Sender<ServerEvent>,
}

impl Hub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: ServerEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => tracing::debug!(event = name, receivers, "broadcast"),
            Err(_) => tracing::debug!(event = name, "broadcast skipped, no connected clients"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
