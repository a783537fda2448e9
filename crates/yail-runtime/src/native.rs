//! Forms that reach into native components: creation, properties, methods
//! and event handlers.

use std::rc::Rc;

use tracing::debug;
use yail_core::{
    ComponentError, ComponentId, ComponentInstance, ErrorKind, EventQueue, NativeValue, StructuredError, TypeTag, Value,
};
use yail_ir::SExpr;

use crate::environment::{Binding, Procedure};
use crate::eval::{Scope, nth, symbol, syntax_error};
use crate::events::EventCallback;
use crate::interpreter::Interpreter;

fn unknown_component(name: &str) -> StructuredError {
    StructuredError::new(ErrorKind::UnknownComponent, format!("Unknown component {}", name)).with_procedure(name)
}

fn component_failure(err: ComponentError) -> StructuredError {
    let kind = match &err {
        ComponentError::UnknownProperty { .. } => ErrorKind::UnknownProperty,
        ComponentError::UnknownMethod { .. } => ErrorKind::UnknownMethod,
        ComponentError::UnknownEvent { .. } => ErrorKind::UnknownEvent,
        ComponentError::ArgCount { .. } => ErrorKind::ArityMismatch,
        ComponentError::Failed(_) => ErrorKind::RuntimeError,
    };
    StructuredError::new(kind, err.to_string())
}

impl Interpreter {
    /// A component named by text on the current screen, or a handle.
    pub(crate) fn resolve_component(&self, value: &Value) -> Result<ComponentId, StructuredError> {
        match value {
            Value::Text(name) => self.component_named(name).ok_or_else(|| unknown_component(name)),
            Value::NativeHandle(id) if self.components.contains_key(id) => Ok(*id),
            other => Err(unknown_component(&self.coercer.display(other))),
        }
    }

    /// Parse a quoted type list such as `'(number text)`.
    pub(crate) fn type_tags(&self, form: &str, types: &Value) -> Result<Vec<TypeTag>, StructuredError> {
        let items = match types {
            Value::List(items) => items.as_slice(),
            Value::Text(t) if t.is_empty() => return Ok(Vec::new()),
            _ => return Err(syntax_error(form, "type list must be a list")),
        };
        items.iter().map(|item| self.type_tag(item)).collect()
    }

    fn type_tag(&self, value: &Value) -> Result<TypeTag, StructuredError> {
        let name = self.coercer.display(value);
        name.parse::<TypeTag>()
            .map_err(|_| StructuredError::runtime(format!("Unknown type {}", name)))
    }

    /// Coerce to `tag`, then on to `declared` when the target kind is stricter.
    fn coerce_to_kind(&self, value: &Value, tag: TypeTag, declared: TypeTag) -> Option<NativeValue> {
        let native = self.coercer.coerce(value, tag).ok()?;
        if declared == TypeTag::Any || declared == tag {
            return Some(native);
        }
        let lifted = self.coercer.lift(native);
        self.coercer.coerce(&lifted, declared).ok()
    }

    /// `(add-component Parent Type Name init...)`
    pub(crate) fn add_component(&mut self, args: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        const FORM: &str = "add-component";
        let parent = symbol(FORM, args, 0)?;
        let type_name = symbol(FORM, args, 1)?;
        let name = symbol(FORM, args, 2)?;

        if self.component_named(parent).is_none() {
            return Err(unknown_component(parent));
        }
        let class = self.classes.resolve(type_name).ok_or_else(|| {
            StructuredError::new(
                ErrorKind::UnknownComponent,
                format!("No component type {} is registered", type_name),
            )
            .with_procedure(name)
        })?;

        let screen = self.current_screen.clone();
        let instance = ComponentInstance::new(class, name, screen);
        let id = instance.id;
        debug!(%id, component = name, kind = type_name, parent, "adding component");
        self.components.insert(id, instance);
        self.current_screen_mut().environment.bind(name, Binding::Component(id));

        self.eval_body(&args[3..], scope)?;
        Ok(Value::nothing())
    }

    /// `(set-and-coerce-property! 'C 'P value 'type)`
    pub(crate) fn set_and_coerce_property(
        &mut self,
        args: &[SExpr],
        scope: &mut Scope,
    ) -> Result<Value, StructuredError> {
        const FORM: &str = "set-and-coerce-property!";
        let component = self.eval(nth(FORM, args, 0)?, scope)?;
        let property = self.eval(nth(FORM, args, 1)?, scope)?;
        let value = self.eval(nth(FORM, args, 2)?, scope)?;
        let tag = self.eval(nth(FORM, args, 3)?, scope)?;

        let id = self.resolve_component(&component)?;
        let property = self.coercer.display(&property);
        let tag = self.type_tag(&tag)?;

        let Some(instance) = self.components.get(&id) else {
            return Err(unknown_component(&self.coercer.display(&component)));
        };
        let declared = match instance.class().property(&property) {
            Some(spec) => spec.kind,
            None => {
                return Err(component_failure(ComponentError::UnknownProperty {
                    component: instance.name.clone(),
                    property,
                }));
            }
        };

        let Some(native) = self.coerce_to_kind(&value, tag, declared) else {
            return Err(self.reporter.generate_runtime_type_error(&property, &[value]));
        };
        if let Some(instance) = self.components.get_mut(&id) {
            instance.set(&property, native).map_err(component_failure)?;
        }
        Ok(Value::nothing())
    }

    /// `(get-property 'C 'P)`
    pub(crate) fn get_property(&mut self, args: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        const FORM: &str = "get-property";
        let component = self.eval(nth(FORM, args, 0)?, scope)?;
        let property = self.eval(nth(FORM, args, 1)?, scope)?;

        let id = self.resolve_component(&component)?;
        let property = self.coercer.display(&property);
        let instance = self
            .components
            .get(&id)
            .ok_or_else(|| unknown_component(&self.coercer.display(&component)))?;
        let native = instance.get(&property).map_err(component_failure)?.clone();
        Ok(self.coercer.lift(native))
    }

    /// `(call-component-method 'C 'M (*list-for-runtime* args...) '(types...))`
    ///
    /// Events the method reports are delivered after it returns, before
    /// the lifted result is handed back.
    pub(crate) fn call_component_method(
        &mut self,
        args: &[SExpr],
        scope: &mut Scope,
    ) -> Result<Value, StructuredError> {
        const FORM: &str = "call-component-method";
        let component = self.eval(nth(FORM, args, 0)?, scope)?;
        let method = self.eval(nth(FORM, args, 1)?, scope)?;
        let values = self.eval(nth(FORM, args, 2)?, scope)?;
        let types = self.eval(nth(FORM, args, 3)?, scope)?;

        let id = self.resolve_component(&component)?;
        let method = self.coercer.display(&method);
        let Value::List(values) = values else {
            return Err(syntax_error(FORM, "arguments must be a list"));
        };
        let tags = self.type_tags(FORM, &types)?;

        let Some(instance) = self.components.get(&id) else {
            return Err(unknown_component(&self.coercer.display(&component)));
        };
        let declared = match instance.class().method(&method) {
            Some(spec) => spec.params.clone(),
            None => {
                return Err(component_failure(ComponentError::UnknownMethod {
                    component: instance.name.clone(),
                    method,
                }));
            }
        };

        let mut natives = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            let declared = declared.get(i).copied().unwrap_or(TypeTag::Any);
            let tag = tags.get(i).copied().unwrap_or(declared);
            match self.coerce_to_kind(value, tag, declared) {
                Some(native) => natives.push(native),
                None => return Err(self.reporter.generate_runtime_type_error(&method, &values)),
            }
        }

        let mut events = EventQueue::new();
        let result = match self.components.get_mut(&id) {
            Some(instance) => instance.call(&method, &natives, &mut events),
            None => return Err(unknown_component(&self.coercer.display(&component))),
        };

        // Deliver what the method reported even when it failed part way
        for pending in events.drain() {
            self.fire_event(pending.component, &pending.event, pending.args);
        }

        let native = result.map_err(component_failure)?;
        Ok(self.coercer.lift(native))
    }

    /// `(define-event C Event (params...) body...)`
    pub(crate) fn define_event(&mut self, args: &[SExpr]) -> Result<Value, StructuredError> {
        const FORM: &str = "define-event";
        let component = symbol(FORM, args, 0)?;
        let event = symbol(FORM, args, 1)?;
        let params = nth(FORM, args, 2)?
            .as_list()
            .ok_or_else(|| syntax_error(FORM, "expected a parameter list"))?
            .iter()
            .map(|p| p.as_symbol().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| syntax_error(FORM, "parameters must be symbols"))?;

        let id = self
            .component_named(component)
            .ok_or_else(|| unknown_component(component))?;
        let Some(instance) = self.components.get(&id) else {
            return Err(unknown_component(component));
        };
        if instance.class().event(event).is_none() {
            return Err(component_failure(ComponentError::UnknownEvent {
                component: component.to_string(),
                event: event.to_string(),
            }));
        }
        let screen = instance.screen.clone();

        let procedure = Rc::new(Procedure {
            name: format!("{}.{}", component, event),
            params,
            body: args[3..].to_vec(),
        });
        // Handlers see the globals of the screen that owns the component
        let owner = screen.clone();
        let callback: EventCallback<Interpreter> = Rc::new(move |interpreter: &mut Interpreter, args: &[Value]| {
            interpreter
                .on_screen(&owner, |interpreter| interpreter.invoke_procedure(&procedure, args.to_vec()))
                .map(|_| ())
        });

        if let Some(screen) = self.screens.get_mut(&screen) {
            screen.events.register(id, event, callback);
        }
        Ok(Value::nothing())
    }
}
