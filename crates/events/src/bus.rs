//! Event bus implementation using named, ordered callback lists

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::warn;

use crate::types::{EventSink, Handler, HandlerResult};

/// Event bus mapping an event name to the callbacks subscribed to it
///
/// Subscriptions are added during setup through `&mut self`; emission only
/// needs `&self`, so a configured bus can be shared by concurrent callers.
pub struct EventBus<P> {
    handlers: HashMap<String, Vec<Handler<P>>>,
    /// Number of emit calls (for monitoring)
    event_count: AtomicUsize,
}

impl<P> EventBus<P> {
    /// Create an empty event bus
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            event_count: AtomicUsize::new(0),
        }
    }

    /// Subscribe a callback to `name`
    ///
    /// Callbacks run in registration order. The registered handler is
    /// returned so callers can keep a reference to it.
    pub fn subscribe<F>(&mut self, name: impl Into<String>, callback: F) -> Handler<P>
    where
        F: Fn(&P) -> HandlerResult + Send + Sync + 'static,
    {
        let handler: Handler<P> = Arc::new(callback);
        self.handlers
            .entry(name.into())
            .or_default()
            .push(Arc::clone(&handler));
        handler
    }

    /// Emit `payload` to every callback subscribed to `name`
    ///
    /// A callback that returns an error or panics is logged and skipped;
    /// the remaining callbacks still run. Returns the number of callbacks
    /// that completed successfully.
    pub fn emit(&self, name: &str, payload: &P) -> usize {
        self.event_count.fetch_add(1, Ordering::Relaxed);

        let Some(handlers) = self.handlers.get(name) else {
            return 0;
        };

        let mut delivered = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    warn!(event = %name, handler = index, error = %e, "Event handler failed");
                }
                Err(_) => {
                    warn!(event = %name, handler = index, "Event handler panicked");
                }
            }
        }
        delivered
    }

    /// Get the number of callbacks subscribed to `name`
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.handlers.get(name).map_or(0, Vec::len)
    }

    /// Get the total number of emit calls
    pub fn event_count(&self) -> usize {
        self.event_count.load(Ordering::Relaxed)
    }
}

impl<P> EventSink<P> for EventBus<P> {
    fn emit(&self, name: &str, payload: &P) -> usize {
        EventBus::emit(self, name, payload)
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscribers: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();

        f.debug_struct("EventBus")
            .field("subscribers", &subscribers)
            .field("event_count", &self.event_count())
            .finish()
    }
}
