//! Event fan-out
//!
//! One `tokio::sync::broadcast` channel per symbol. The facade publishes
//! while holding the symbol's lock, so subscribers observe a symbol's
//! events in exactly the emission order; events from two `place` calls on
//! the same symbol never interleave. Dropping a receiver unsubscribes.

use std::collections::HashMap;

use tokio::sync::broadcast;
use tracing::trace;

use matching_engine::BookEvent;
use types::ids::Symbol;

const CHANNEL_CAPACITY: usize = 1024;

/// Per-symbol broadcast channels, fixed at construction
#[derive(Debug)]
pub struct EventBroadcaster {
    channels: HashMap<Symbol, broadcast::Sender<BookEvent>>,
}

impl EventBroadcaster {
    /// Create channels for the given symbols
    pub fn new(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        let channels = symbols
            .into_iter()
            .map(|symbol| (symbol, broadcast::channel(CHANNEL_CAPACITY).0))
            .collect();
        Self { channels }
    }

    /// Subscribe to one symbol's events
    pub fn subscribe(&self, symbol: &Symbol) -> Option<broadcast::Receiver<BookEvent>> {
        self.channels.get(symbol).map(|sender| sender.subscribe())
    }

    /// Publish events in order; lagging or absent subscribers are not an
    /// error
    pub fn publish(&self, symbol: &Symbol, events: &[BookEvent]) {
        let Some(sender) = self.channels.get(symbol) else {
            return;
        };
        for event in events {
            trace!(symbol = %symbol, event = event.label(), "publishing");
            // send fails only when no receiver exists; fine either way
            let _ = sender.send(event.clone());
        }
    }

    pub fn subscriber_count(&self, symbol: &Symbol) -> usize {
        self.channels
            .get(symbol)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}
