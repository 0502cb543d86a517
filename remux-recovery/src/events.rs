//! Event fan-out
//!
//! The orchestrator publishes completion and archive events to a generic
//! hub behind this trait. Publishing is fire-and-forget: a dropped event
//! never affects correctness because pollers reach the same end state
//! through `get_job`.

use tokio::sync::broadcast;
use tracing::debug;

use remux_protocol::RecoveryEvent;

/// Sink for recovery events
pub trait EventSink: Send + Sync {
    /// Publish an event, at-most-once, best-effort
    fn publish(&self, event: RecoveryEvent);
}

/// Sink that drops every event
#[derive(Debug, Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: RecoveryEvent) {}
}

/// Sink backed by a tokio broadcast channel
///
/// Lagging or absent subscribers lose events, which is the intended
/// delivery contract.
#[derive(Debug)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<RecoveryEvent>,
}

impl BroadcastEventSink {
    /// Create a sink with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to published events
    pub fn subscribe(&self) -> broadcast::Receiver<RecoveryEvent> {
        self.sender.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, event: RecoveryEvent) {
        // send only fails when there are no receivers; that is fine
        if self.sender.send(event).is_err() {
            debug!("No subscribers for recovery event");
        }
    }
}
