use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use taskline_types::ServerEvent;

type Handler = Box<dyn Fn(&ServerEvent) -> anyhow::Result<()> + Send + Sync>;
type HandlerSlot = (u64, Handler);

/// Fans decoded server events out to registered handlers
///
/// Handlers run synchronously in registration order; a failing handler is
/// logged and does not stop delivery to the remaining ones. The dispatcher
/// never interprets the event variants, that is left to the handlers.
pub struct EventDispatcher {
    handlers: Arc<Mutex<Vec<HandlerSlot>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a handler; it stays registered until the returned token's
    /// `unsubscribe` is called (discarding the token leaves it in place)
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ServerEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Box::new(handler)));
        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    /// Deliver one event to every handler, in registration order
    ///
    /// Holds the handler list for the duration of the call, so events are
    /// processed one at a time and never interleave.
    pub fn dispatch(&self, event: &ServerEvent) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for (id, handler) in handlers.iter() {
            if let Err(e) = handler(event) {
                tracing::warn!(handler_id = id, error = %e, "event handler failed");
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Token returned by [`EventDispatcher::subscribe`]
pub struct Subscription {
    id: u64,
    handlers: Weak<Mutex<Vec<HandlerSlot>>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(handlers) = self.handlers.upgrade() {
            handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}
