//! Event dispatch registry.
//!
//! Maps (component identity, event name) to an ordered list of callbacks.
//! Callbacks are generic over a context so the interpreter and plain test
//! harnesses can share the same registry type.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};
use yail_core::{ComponentId, ErrorKind, StructuredError, Value};

/// Handler invoked with already-lifted event arguments.
pub type EventCallback<C> = Rc<dyn Fn(&mut C, &[Value]) -> Result<(), StructuredError>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    pub component: ComponentId,
    pub event: String,
}

impl EventKey {
    pub fn new(component: ComponentId, event: impl Into<String>) -> Self {
        Self {
            component,
            event: event.into(),
        }
    }
}

/// Result of delivering one event.
#[derive(Debug, Default)]
pub struct Dispatched {
    /// False when no callback was registered for the key.
    pub handled: bool,
    /// Failures of individual callbacks, already wrapped as dispatch failures.
    pub failures: Vec<StructuredError>,
}

pub struct EventRegistry<C> {
    handlers: HashMap<EventKey, Vec<EventCallback<C>>>,
}

impl<C> Default for EventRegistry<C> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<C> std::fmt::Debug for EventRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("keys", &self.handlers.len())
            .finish()
    }
}

impl<C> EventRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback. Registering the same handler twice makes it run twice.
    pub fn register(&mut self, component: ComponentId, event: impl Into<String>, callback: EventCallback<C>) {
        let key = EventKey::new(component, event);
        debug!(component = %key.component, event = %key.event, "registered event handler");
        self.handlers.entry(key).or_default().push(callback);
    }

    /// Snapshot of the callbacks for a key, in registration order.
    ///
    /// Returning owned handles lets the caller run them while mutating the
    /// context that owns this registry.
    pub fn handlers_for(&self, component: ComponentId, event: &str) -> Vec<EventCallback<C>> {
        self.handlers
            .get(&EventKey::new(component, event))
            .cloned()
            .unwrap_or_default()
    }

    pub fn handler_count(&self, key: &EventKey) -> usize {
        self.handlers.get(key).map_or(0, Vec::len)
    }

    /// Deliver an event to a context that does not own this registry.
    pub fn dispatch(&self, cx: &mut C, component: ComponentId, event: &str, args: &[Value]) -> Dispatched {
        run_callbacks(&self.handlers_for(component, event), cx, event, args)
    }

    pub fn unregister_component(&mut self, component: ComponentId) -> usize {
        let mut removed = 0;
        self.handlers.retain(|key, callbacks| {
            let keep = key.component != component;
            if !keep {
                removed += callbacks.len();
            }
            keep
        });
        removed
    }

    pub fn unregister_all(&mut self) {
        self.handlers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Run callbacks in order. A failing callback does not stop the others.
pub fn run_callbacks<C>(callbacks: &[EventCallback<C>], cx: &mut C, event: &str, args: &[Value]) -> Dispatched {
    let mut dispatched = Dispatched {
        handled: !callbacks.is_empty(),
        failures: Vec::new(),
    };
    for callback in callbacks {
        if let Err(err) = callback(cx, args) {
            warn!(event, reason = %err.reason, "event handler failed");
            dispatched.failures.push(StructuredError {
                kind: ErrorKind::DispatchFailure,
                procedure_name: Some(event.to_string()),
                ..err
            });
        }
    }
    dispatched
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<String>;

    fn recorder(label: &'static str) -> EventCallback<Log> {
        Rc::new(move |log: &mut Log, args: &[Value]| -> Result<(), StructuredError> {
            log.push(format!("{label}:{}", args.len()));
            Ok(())
        })
    }

    #[test]
    fn test_registration_order() {
        let mut registry = EventRegistry::new();
        let button = ComponentId::next();
        registry.register(button, "Click", recorder("first"));
        registry.register(button, "Click", recorder("second"));

        let mut log = Log::new();
        let outcome = registry.dispatch(&mut log, button, "Click", &[]);
        assert!(outcome.handled);
        assert_eq!(log, vec!["first:0", "second:0"]);
    }

    #[test]
    fn test_unknown_key_is_not_handled() {
        let registry: EventRegistry<Log> = EventRegistry::new();
        let mut log = Log::new();
        let outcome = registry.dispatch(&mut log, ComponentId::next(), "Click", &[]);
        assert!(!outcome.handled);
        assert!(outcome.failures.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn test_keys_use_identity() {
        let mut registry = EventRegistry::new();
        let a = ComponentId::next();
        let b = ComponentId::next();
        registry.register(a, "Click", recorder("a"));

        let mut log = Log::new();
        assert!(!registry.dispatch(&mut log, b, "Click", &[]).handled);
        assert!(registry.dispatch(&mut log, a, "Click", &[Value::from(1)]).handled);
        assert_eq!(log, vec!["a:1"]);
    }

    #[test]
    fn test_failure_does_not_stop_siblings() {
        let mut registry = EventRegistry::new();
        let button = ComponentId::next();
        registry.register(button, "Click", recorder("before"));
        registry.register(
            button,
            "Click",
            Rc::new(|_: &mut Log, _: &[Value]| -> Result<(), StructuredError> {
                Err(StructuredError::runtime("boom"))
            }),
        );
        registry.register(button, "Click", recorder("after"));

        let mut log = Log::new();
        let outcome = registry.dispatch(&mut log, button, "Click", &[]);
        assert_eq!(log, vec!["before:0", "after:0"]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, ErrorKind::DispatchFailure);
        assert_eq!(outcome.failures[0].reason, "boom");
    }

    #[test]
    fn test_unregister() {
        let mut registry = EventRegistry::new();
        let a = ComponentId::next();
        let b = ComponentId::next();
        registry.register(a, "Click", recorder("a"));
        registry.register(a, "Click", recorder("a2"));
        registry.register(a, "LongClick", recorder("a"));
        registry.register(b, "Click", recorder("b"));

        assert_eq!(registry.unregister_component(a), 3);
        assert_eq!(registry.handler_count(&EventKey::new(a, "Click")), 0);
        assert_eq!(registry.handler_count(&EventKey::new(b, "Click")), 1);

        registry.unregister_all();
        assert!(registry.is_empty());
    }
}
