//! Auction event bus seam. The reporter consumes the host framework's
//! event history and subscribes to live events through [`AuctionEventSource`].
//!
//! [`InMemoryEventBus`] is a synchronous reference bus used by tests and the
//! replay CLI: it records every emitted event and dispatches to listeners
//! before `emit` returns.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::types::{AuctionEvent, EventKind, RecordedEvent};

/// Callback invoked with the raw event arguments.
pub type Listener = Arc<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Source of auction events: past history plus live subscription.
pub trait AuctionEventSource: Send + Sync {
    /// Every event fired so far, in emission order.
    fn past_events(&self) -> Vec<RecordedEvent>;

    /// Register a listener for all future events of `kind`.
    fn on(&self, kind: EventKind, listener: Listener);
}

/// Synchronous in-process bus with full history.
#[derive(Default)]
pub struct InMemoryEventBus {
    history: Mutex<Vec<RecordedEvent>>,
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus pre-seeded with history, e.g. events recorded before the
    /// reporter was enabled.
    pub fn with_history(history: Vec<RecordedEvent>) -> Self {
        Self {
            history: Mutex::new(history),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Record and dispatch an event.
    pub fn emit(&self, kind: EventKind, args: serde_json::Value) {
        self.history.lock().push(RecordedEvent::new(kind, args.clone()));

        // Snapshot so listeners never run under the lock.
        let listeners = self
            .listeners
            .lock()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        trace!(event = %kind, listeners = listeners.len(), "dispatching auction event");
        for listener in listeners {
            listener(&args);
        }
    }

    pub fn emit_event(&self, event: &AuctionEvent) -> Result<(), serde_json::Error> {
        let args = event.to_args()?;
        self.emit(event.kind(), args);
        Ok(())
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

impl AuctionEventSource for InMemoryEventBus {
    fn past_events(&self) -> Vec<RecordedEvent> {
        self.history.lock().clone()
    }

    fn on(&self, kind: EventKind, listener: Listener) {
        self.listeners.lock().entry(kind).or_default().push(listener);
    }
}

/// Convenience: create an empty shared bus.
pub fn in_memory_bus() -> Arc<InMemoryEventBus> {
    Arc::new(InMemoryEventBus::new())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::BidWon;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_emit_records_history_in_order() {
        let bus = in_memory_bus();
        bus.emit(EventKind::BidRequested, serde_json::json!({"bidderCode": "a"}));
        bus.emit(EventKind::BidWon, serde_json::json!({"bidderCode": "a", "cpm": 1.0}));

        let history = bus.past_events();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event_type, "bidRequested");
        assert_eq!(history[1].event_type, "bidWon");
    }

    #[test]
    fn test_listeners_only_receive_their_kind() {
        let bus = in_memory_bus();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        bus.on(
            EventKind::BidTimeout,
            Arc::new(move |_args: &serde_json::Value| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        bus.emit(EventKind::BidRequested, serde_json::json!({}));
        bus.emit(EventKind::BidTimeout, serde_json::json!([{"bidder": "a"}]));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(EventKind::BidTimeout), 1);
        assert_eq!(bus.listener_count(EventKind::BidWon), 0);
    }

    #[test]
    fn test_listener_may_emit_reentrantly() {
        let bus = in_memory_bus();
        let inner = bus.clone();
        bus.on(
            EventKind::BidRequested,
            Arc::new(move |_args: &serde_json::Value| {
                inner.emit(EventKind::BidTimeout, serde_json::json!([]));
            }),
        );

        bus.emit(EventKind::BidRequested, serde_json::json!({}));
        assert_eq!(bus.history_len(), 2);
    }

    #[test]
    fn test_emit_typed_event() {
        let bus = InMemoryEventBus::with_history(Vec::new());
        bus.emit_event(&AuctionEvent::BidWon(BidWon {
            bidder_code: Some("acme".into()),
            cpm: Some(2.5),
        }))
        .unwrap();

        let history = bus.past_events();
        assert_eq!(history[0].args["bidderCode"], "acme");
        assert!(history[0].decode().is_some());
    }
}
