//! Fire-and-forget notifications about provider and cache state.
//!
//! Events are published on a `tokio::sync::broadcast` channel. Publishing
//! never fails from the gateway's point of view: with no subscribers, or
//! with subscribers that have fallen behind, events are simply dropped.

use serde::Serialize;
use tokio::sync::broadcast;

/// Default capacity of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// State change announced by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// The default provider changed.
    ActiveProviderChanged { provider: String },
    /// A cache namespace was cleared.
    CacheCleared { namespace: String },
    /// A provider used up its retry budget during a request.
    ProviderFailed {
        provider: String,
        operation: String,
        error: String,
    },
    /// The offline heuristic answered because every provider failed.
    Degraded { operation: String },
}

/// Publishing side of the notification channel.
#[derive(Debug, Clone)]
pub struct EventNotifier {
    tx: broadcast::Sender<GatewayEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.tx.subscribe()
    }

    /// Publish an event, ignoring delivery failures.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
