//! Per-event-name hooks run before an event is broadcast.
//!
//! The hub never looks at event names. Integrators that need behavior tied
//! to a particular event (say, stamping a color on every `"chat"` message)
//! register an [`EventHandler`] here; each connection's inbound pump passes
//! decoded events through [`HandlerRegistry::apply`] before submitting them.

use std::collections::HashMap;
use std::sync::Arc;

use wsevents_core::Event;

/// Hook bound to one event name.
pub trait EventHandler: Send + Sync {
    /// Transform the event, or return `None` to stop it from being broadcast.
    fn handle(&self, event: Event) -> Option<Event>;
}

impl<F> EventHandler for F
where
    F: Fn(Event) -> Option<Event> + Send + Sync,
{
    fn handle(&self, event: Event) -> Option<Event> {
        self(event)
    }
}

/// Registry mapping event names to handlers.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry. Every event passes through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `name`, replacing any previous handler.
    pub fn register(&mut self, name: &str, handler: impl EventHandler + 'static) {
        let _ = self.handlers.insert(name.to_owned(), Arc::new(handler));
    }

    /// Whether a handler is bound to `name`.
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered event names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Run the handler bound to the event's name, if any.
    pub fn apply(&self, event: Event) -> Option<Event> {
        match self.handlers.get(event.name()) {
            Some(handler) => handler.handle(event),
            None => Some(event),
        }
    }
}
