//! The native component contract.
//!
//! Components are described by registration tables instead of reflection: a
//! [`ComponentClass`] lists its typed properties, its methods (with parameter
//! kinds and a handler) and the events it can report. Classes are built once per
//! type, either in Rust through [`ComponentClassBuilder`] or from a TOML schema.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::coerce::Coercer;
use crate::schema::{ComponentSchema, SchemaError};
use crate::value::{ComponentId, NativeValue, TypeTag};

/// Native implementation of a component method.
///
/// Handlers may mutate the instance and report events into the queue; the
/// events are delivered once the handler has returned.
pub type MethodHandler =
    Rc<dyn Fn(&mut ComponentInstance, &[NativeValue], &mut EventQueue) -> Result<NativeValue, ComponentError>>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComponentError {
    #[error("{component} has no property {property}")]
    UnknownProperty { component: String, property: String },

    #[error("{component} has no method {method}")]
    UnknownMethod { component: String, method: String },

    #[error("{component} has no event {event}")]
    UnknownEvent { component: String, event: String },

    #[error("{method} expects {expected} arguments, got {got}")]
    ArgCount {
        method: String,
        expected: usize,
        got: usize,
    },

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertySpec {
    pub name: String,
    pub kind: TypeTag,
    pub default: NativeValue,
}

#[derive(Clone)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<TypeTag>,
    pub returns: TypeTag,
    pub handler: MethodHandler,
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventSpec {
    pub name: String,
    pub params: Vec<String>,
}

/// Registration table for one component type.
#[derive(Debug, Clone)]
pub struct ComponentClass {
    name: String,
    properties: IndexMap<String, PropertySpec>,
    methods: IndexMap<String, MethodSpec>,
    events: IndexMap<String, EventSpec>,
}

impl ComponentClass {
    pub fn builder(name: impl Into<String>) -> ComponentClassBuilder {
        ComponentClassBuilder {
            class: ComponentClass {
                name: name.into(),
                properties: IndexMap::new(),
                methods: IndexMap::new(),
                events: IndexMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.get(name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    pub fn event(&self, name: &str) -> Option<&EventSpec> {
        self.events.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertySpec> {
        self.properties.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &EventSpec> {
        self.events.values()
    }
}

pub struct ComponentClassBuilder {
    class: ComponentClass,
}

impl ComponentClassBuilder {
    pub fn property(mut self, name: impl Into<String>, kind: TypeTag, default: NativeValue) -> Self {
        let name = name.into();
        self.class
            .properties
            .insert(name.clone(), PropertySpec { name, kind, default });
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, params: &[TypeTag], returns: TypeTag, handler: F) -> Self
    where
        F: Fn(&mut ComponentInstance, &[NativeValue], &mut EventQueue) -> Result<NativeValue, ComponentError>
            + 'static,
    {
        let name = name.into();
        self.class.methods.insert(
            name.clone(),
            MethodSpec {
                name,
                params: params.to_vec(),
                returns,
                handler: Rc::new(handler),
            },
        );
        self
    }

    pub fn event(mut self, name: impl Into<String>, params: &[&str]) -> Self {
        let name = name.into();
        self.class.events.insert(
            name.clone(),
            EventSpec {
                name,
                params: params.iter().map(|p| p.to_string()).collect(),
            },
        );
        self
    }

    pub fn build(self) -> ComponentClass {
        self.class
    }
}

/// A live component: stable identity plus current property values.
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    pub id: ComponentId,
    pub name: String,
    /// Screen the instance was created on.
    pub screen: String,
    class: Rc<ComponentClass>,
    properties: IndexMap<String, NativeValue>,
}

impl ComponentInstance {
    pub fn new(class: Rc<ComponentClass>, name: impl Into<String>, screen: impl Into<String>) -> Self {
        let properties = class
            .properties()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect();
        Self {
            id: ComponentId::next(),
            name: name.into(),
            screen: screen.into(),
            class,
            properties,
        }
    }

    pub fn class(&self) -> &ComponentClass {
        &self.class
    }

    pub fn get(&self, property: &str) -> Result<&NativeValue, ComponentError> {
        self.properties
            .get(property)
            .ok_or_else(|| ComponentError::UnknownProperty {
                component: self.name.clone(),
                property: property.to_string(),
            })
    }

    /// Set a declared property. The value is expected to already have the
    /// property's kind.
    pub fn set(&mut self, property: &str, value: NativeValue) -> Result<(), ComponentError> {
        match self.properties.get_mut(property) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ComponentError::UnknownProperty {
                component: self.name.clone(),
                property: property.to_string(),
            }),
        }
    }

    pub fn call(
        &mut self,
        method: &str,
        args: &[NativeValue],
        events: &mut EventQueue,
    ) -> Result<NativeValue, ComponentError> {
        let spec = self
            .class
            .method(method)
            .ok_or_else(|| ComponentError::UnknownMethod {
                component: self.name.clone(),
                method: method.to_string(),
            })?;
        if spec.params.len() != args.len() {
            return Err(ComponentError::ArgCount {
                method: method.to_string(),
                expected: spec.params.len(),
                got: args.len(),
            });
        }
        // The handler borrows the instance mutably
        let handler = Rc::clone(&spec.handler);
        handler(self, args, events)
    }

    /// Report one of this component's declared events.
    pub fn report(&self, events: &mut EventQueue, event: &str, args: Vec<NativeValue>) -> Result<(), ComponentError> {
        if self.class.event(event).is_none() {
            return Err(ComponentError::UnknownEvent {
                component: self.name.clone(),
                event: event.to_string(),
            });
        }
        events.fire(self.id, event, args);
        Ok(())
    }
}

/// An event reported by a component, waiting to be dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub component: ComponentId,
    pub event: String,
    pub args: Vec<NativeValue>,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<PendingEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&mut self, component: ComponentId, event: impl Into<String>, args: Vec<NativeValue>) {
        self.pending.push(PendingEvent {
            component,
            event: event.into(),
            args,
        });
    }

    pub fn drain(&mut self) -> Vec<PendingEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

/// Component types known to the runtime, by type name.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    classes: IndexMap<String, Rc<ComponentClass>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-loaded with the bundled component schema.
    pub fn with_builtins(coercer: &Coercer) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        registry.load_schema(&ComponentSchema::builtin()?, coercer)?;
        Ok(registry)
    }

    pub fn load_schema(&mut self, schema: &ComponentSchema, coercer: &Coercer) -> Result<(), SchemaError> {
        for class in schema.build_classes(coercer)? {
            self.register(class);
        }
        Ok(())
    }

    /// Register a class, replacing any class of the same name.
    pub fn register(&mut self, class: ComponentClass) {
        self.classes.insert(class.name.clone(), Rc::new(class));
    }

    /// Resolve a type name. Fully-qualified names such as
    /// `com.example.components.Button` resolve by their last segment.
    pub fn resolve(&self, type_name: &str) -> Option<Rc<ComponentClass>> {
        self.classes
            .get(type_name)
            .or_else(|| {
                let short = type_name.rsplit('.').next()?;
                self.classes.get(short)
            })
            .cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_class() -> ComponentClass {
        ComponentClass::builder("Counter")
            .property("Count", TypeTag::Integer, NativeValue::Integer(0))
            .event("Changed", &["count"])
            .method("Increment", &[TypeTag::Integer], TypeTag::Integer, |this, args, events| {
                let (NativeValue::Integer(current), [NativeValue::Integer(by)]) = (this.get("Count")?.clone(), args)
                else {
                    return Err(ComponentError::Failed("bad count".into()));
                };
                let next = current + by;
                this.set("Count", NativeValue::Integer(next))?;
                this.report(events, "Changed", vec![NativeValue::Integer(next)])?;
                Ok(NativeValue::Integer(next))
            })
            .build()
    }

    #[test]
    fn test_instance_starts_with_defaults() {
        let instance = ComponentInstance::new(Rc::new(counter_class()), "Counter1", "Screen1");
        assert_eq!(instance.get("Count"), Ok(&NativeValue::Integer(0)));
        assert!(instance.get("Missing").is_err());
    }

    #[test]
    fn test_method_mutates_and_reports() {
        let mut instance = ComponentInstance::new(Rc::new(counter_class()), "Counter1", "Screen1");
        let mut events = EventQueue::new();
        let result = instance
            .call("Increment", &[NativeValue::Integer(5)], &mut events)
            .unwrap();
        assert_eq!(result, NativeValue::Integer(5));
        assert_eq!(instance.get("Count"), Ok(&NativeValue::Integer(5)));

        let fired = events.drain();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].component, instance.id);
        assert_eq!(fired[0].event, "Changed");
        assert!(events.is_empty());
    }

    #[test]
    fn test_method_arity_is_checked() {
        let mut instance = ComponentInstance::new(Rc::new(counter_class()), "Counter1", "Screen1");
        let err = instance.call("Increment", &[], &mut EventQueue::new()).unwrap_err();
        assert_eq!(
            err,
            ComponentError::ArgCount {
                method: "Increment".into(),
                expected: 1,
                got: 0
            }
        );
    }

    #[test]
    fn test_identical_instances_have_distinct_ids() {
        let class = Rc::new(counter_class());
        let a = ComponentInstance::new(Rc::clone(&class), "A", "Screen1");
        let b = ComponentInstance::new(class, "A", "Screen1");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_registry_resolves_qualified_names() {
        let mut registry = ComponentRegistry::new();
        registry.register(counter_class());
        assert!(registry.resolve("Counter").is_some());
        assert!(registry.resolve("com.example.components.Counter").is_some());
        assert!(registry.resolve("Slider").is_none());
    }

    #[test]
    fn test_builtin_registry() {
        let registry = ComponentRegistry::with_builtins(&Coercer::default()).unwrap();
        for name in ["Form", "Button", "Label", "TextBox", "Clock"] {
            assert!(registry.resolve(name).is_some(), "missing {name}");
        }
    }
}
