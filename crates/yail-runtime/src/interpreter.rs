//! The interpreter core.
//!
//! One [`Interpreter`] serves a whole running app. Every screen has its own
//! [`Environment`] and [`EventRegistry`]; component instances live in a single
//! table keyed by identity. Evaluation failures never escape as panics or
//! `Err`s from [`Interpreter::evaluate`]: they become the current exception and
//! the call returns the non-coercible sentinel.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use yail_core::{
    Coercer, ComponentClass, ComponentId, ComponentInstance, ComponentRegistry, ErrorKind, ErrorReporter,
    NativeValue, ResultKind, ResultStatus, ReturnChannel, StructuredError, Value,
};

use crate::config::{ConfigError, RuntimeConfig};
use crate::environment::{Binding, Environment};
use crate::eval::Scope;
use crate::events::{self, EventRegistry};

/// Block id used for results that belong to no REPL block.
pub const NO_BLOCK: &str = "-1";

/// Bindings and handlers of one screen.
#[derive(Debug, Default)]
pub struct Screen {
    pub environment: Environment,
    pub events: EventRegistry<Interpreter>,
    /// The screen's own form component.
    pub form: Option<ComponentId>,
}

/// What [`Interpreter::collect_garbage`] released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    pub components: usize,
    pub handlers: usize,
}

pub struct Interpreter {
    pub(crate) config: RuntimeConfig,
    pub(crate) coercer: Coercer,
    pub(crate) classes: ComponentRegistry,
    pub(crate) components: HashMap<ComponentId, ComponentInstance>,
    pub(crate) screens: IndexMap<String, Screen>,
    pub(crate) current_screen: String,
    screen_stack: Vec<String>,
    channel: Arc<ReturnChannel>,
    exception: Option<StructuredError>,
    pub(crate) reporter: ErrorReporter,
    pub(crate) depth: usize,
    block_id: Option<String>,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("current_screen", &self.current_screen)
            .field("screens", &self.screens.len())
            .field("components", &self.components.len())
            .field("exception", &self.exception)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Create an interpreter with its own return channel.
    pub fn new(config: RuntimeConfig) -> Result<Self, ConfigError> {
        let coercer = config.coercer()?;
        Self::with_channel(config, Arc::new(ReturnChannel::new(coercer)))
    }

    /// Create an interpreter that reports into an existing channel.
    pub fn with_channel(config: RuntimeConfig, channel: Arc<ReturnChannel>) -> Result<Self, ConfigError> {
        let coercer = config.coercer()?;
        let classes = config.component_registry(&coercer)?;
        let current_screen = config.default_screen.clone();
        let mut interpreter = Self {
            config,
            coercer,
            classes,
            components: HashMap::new(),
            screens: IndexMap::new(),
            current_screen: current_screen.clone(),
            screen_stack: Vec::new(),
            channel,
            exception: None,
            reporter: ErrorReporter::new(coercer),
            depth: 0,
            block_id: None,
        };
        interpreter.attach_screen(&current_screen);
        Ok(interpreter)
    }

    pub fn coercer(&self) -> &Coercer {
        &self.coercer
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn channel(&self) -> Arc<ReturnChannel> {
        Arc::clone(&self.channel)
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn reporter_mut(&mut self) -> &mut ErrorReporter {
        &mut self.reporter
    }

    /// Add a component type defined in Rust.
    pub fn register_class(&mut self, class: ComponentClass) {
        self.classes.register(class);
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Evaluate YAIL source. On failure the error becomes the current
    /// exception and the non-coercible sentinel is returned.
    pub fn evaluate(&mut self, source: &str) -> Value {
        match self.try_evaluate(source) {
            Ok(value) => value,
            Err(err) => {
                debug!(kind = ?err.kind, reason = %err.reason, "evaluation failed");
                self.exception = Some(err);
                Value::NonCoercible
            }
        }
    }

    /// Evaluate YAIL source, returning the error instead of storing it.
    pub fn try_evaluate(&mut self, source: &str) -> Result<Value, StructuredError> {
        debug!(len = source.len(), "evaluating");
        let forms = yail_ir::read(source).map_err(|e| StructuredError::new(ErrorKind::SyntaxError, e.to_string()))?;
        for form in &forms {
            yail_ir::validate(form).map_err(|e| StructuredError::new(ErrorKind::SyntaxError, e.to_string()))?;
        }

        let mut result = Value::nothing();
        for form in &forms {
            let mut scope = Scope::default();
            result = self.eval(form, &mut scope)?;
        }
        debug!(result = %self.coercer.display(&result), "evaluated");
        Ok(result)
    }

    pub fn current_exception(&self) -> Option<&StructuredError> {
        self.exception.as_ref()
    }

    pub fn clear_exception(&mut self) {
        self.exception = None;
    }

    // =========================================================================
    // REPL protocol
    // =========================================================================

    /// Evaluate one REPL block and queue its result under `block_id`.
    pub fn process_repl_input(&mut self, block_id: &str, source: &str) -> Result<(), StructuredError> {
        if block_id.is_empty() {
            warn!("REPL input without block id");
            return Err(StructuredError::new(ErrorKind::ChannelFailure, "block id must not be empty"));
        }

        self.clear_exception();
        self.block_id = Some(block_id.to_string());
        let value = self.evaluate(source);
        self.block_id = None;

        let pushed = match self.exception.take() {
            None => self.channel.push(block_id, ResultStatus::Ok, value),
            Some(err) => self.channel.push(block_id, ResultStatus::Error, Value::Text(err.reason)),
        };
        pushed.map_err(|e| StructuredError::new(ErrorKind::ChannelFailure, e.to_string()))
    }

    /// Switch to another screen, remembering the current one.
    pub fn push_screen(&mut self, name: &str) {
        self.screen_stack.push(self.current_screen.clone());
        self.set_current_form(name);
        self.notify(ResultKind::PushScreen, Value::from(name));
    }

    /// Return to the previous screen, handing back `result`.
    pub fn pop_screen(&mut self, result: Value) {
        if let Some(previous) = self.screen_stack.pop() {
            self.set_current_form(&previous);
        }
        self.notify(ResultKind::PopScreen, result);
    }

    fn notify(&self, kind: ResultKind, payload: Value) {
        let block_id = self.block_id.as_deref().unwrap_or(NO_BLOCK);
        if let Err(err) = self.channel.push_kind(block_id, ResultStatus::Ok, payload, kind) {
            warn!(%err, ?kind, "could not queue screen change");
        }
    }

    // =========================================================================
    // Screens
    // =========================================================================

    pub fn current_form(&self) -> &str {
        &self.current_screen
    }

    pub fn screen(&self, name: &str) -> Option<&Screen> {
        self.screens.get(name)
    }

    /// Environment of the current screen.
    pub fn environment(&self) -> Option<&Environment> {
        self.screens.get(&self.current_screen).map(|s| &s.environment)
    }

    pub(crate) fn current_screen_mut(&mut self) -> &mut Screen {
        self.screens.entry(self.current_screen.clone()).or_default()
    }

    /// Make sure the screen `name` exists, with its form component bound
    /// under the screen's name. Returns the form's identity.
    pub fn attach_screen(&mut self, name: &str) -> ComponentId {
        if let Some(id) = self.screens.get(name).and_then(|s| s.form) {
            return id;
        }
        info!(screen = name, "attaching screen");
        let id = self.create_form(name);
        let screen = self.screens.entry(name.to_string()).or_default();
        screen.form = Some(id);
        screen.environment.bind(name, Binding::Component(id));
        id
    }

    /// Attach `name` if needed and make it the current screen.
    pub fn set_current_form(&mut self, name: &str) {
        self.attach_screen(name);
        self.current_screen = name.to_string();
    }

    /// Run `f` with `screen` current. The previous screen comes back unless
    /// `f` switched screens itself.
    pub(crate) fn on_screen<T>(&mut self, screen: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        if self.current_screen == screen {
            return f(self);
        }
        let previous = std::mem::replace(&mut self.current_screen, screen.to_string());
        let result = f(self);
        if self.current_screen == screen {
            self.current_screen = previous;
        }
        result
    }

    fn create_form(&mut self, name: &str) -> ComponentId {
        let class = self
            .classes
            .resolve("Form")
            .unwrap_or_else(|| Rc::new(ComponentClass::builder("Form").build()));
        let instance = ComponentInstance::new(class, name, name);
        let id = instance.id;
        self.components.insert(id, instance);
        id
    }

    /// Destroy the current screen's bindings, handlers and components. The
    /// screen keeps a fresh form and stays usable.
    pub fn reset_current_form(&mut self) {
        let name = self.current_screen.clone();
        info!(screen = %name, "resetting screen");
        self.components.retain(|_, c| c.screen != name);
        if let Some(screen) = self.screens.get_mut(&name) {
            screen.environment.reset_all();
            screen.events.unregister_all();
            screen.form = None;
        }
        self.attach_screen(&name);
    }

    /// Drop every screen, component, handler and pending exception, then
    /// start over with the default screen.
    pub fn teardown(&mut self) {
        info!("tearing down interpreter");
        self.screens.clear();
        self.components.clear();
        self.screen_stack.clear();
        self.exception = None;
        self.depth = 0;
        self.block_id = None;
        self.current_screen = self.config.default_screen.clone();
        let default_screen = self.current_screen.clone();
        self.attach_screen(&default_screen);
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Component bound to `name` on the current screen.
    pub fn component_named(&self, name: &str) -> Option<ComponentId> {
        match self.environment()?.lookup(name)? {
            Binding::Component(id) => Some(*id),
            _ => None,
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentInstance> {
        self.components.get(&id)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Free components that no screen can reach any more, along with their
    /// event handlers.
    pub fn collect_garbage(&mut self) -> GcStats {
        let mut reachable = HashSet::new();
        for screen in self.screens.values() {
            reachable.extend(screen.form);
            reachable.extend(screen.environment.components());
            for name in screen.environment.names() {
                if let Some(Binding::Global(value)) = screen.environment.lookup(name) {
                    collect_handles(value, &mut reachable);
                }
            }
        }

        let garbage: Vec<(ComponentId, String)> = self
            .components
            .values()
            .filter(|c| !reachable.contains(&c.id))
            .map(|c| (c.id, c.screen.clone()))
            .collect();

        let mut stats = GcStats::default();
        for (id, screen) in garbage {
            self.components.remove(&id);
            stats.components += 1;
            if let Some(screen) = self.screens.get_mut(&screen) {
                stats.handlers += screen.events.unregister_component(id);
            }
        }
        info!(components = stats.components, handlers = stats.handlers, "collected garbage");
        stats
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Deliver an event with already-lifted arguments. Returns false when no
    /// handler is registered. Handler failures are reported, not returned.
    pub fn dispatch(&mut self, component: ComponentId, event: &str, args: &[Value]) -> bool {
        let callbacks = match self.components.get(&component) {
            Some(instance) => self
                .screens
                .get(&instance.screen)
                .map(|s| s.events.handlers_for(component, event))
                .unwrap_or_default(),
            None => {
                debug!(%component, event, "event for unknown component");
                return false;
            }
        };

        let outcome = events::run_callbacks(&callbacks, self, event, args);
        for failure in outcome.failures {
            self.report_handler_failure(failure);
        }
        outcome.handled
    }

    /// Deliver an event reported by native code.
    pub fn fire_event(&mut self, component: ComponentId, event: &str, args: Vec<NativeValue>) -> bool {
        let lifted: Vec<Value> = args.into_iter().map(|a| self.coercer.lift(a)).collect();
        self.dispatch(component, event, &lifted)
    }

    fn report_handler_failure(&mut self, err: StructuredError) {
        let block_id = self.block_id.as_deref().unwrap_or(NO_BLOCK);
        if let Err(e) = self.channel.push_kind(
            block_id,
            ResultStatus::Error,
            Value::Text(err.reason.clone()),
            ResultKind::Error,
        ) {
            warn!(%e, "could not queue handler failure");
        }
        self.reporter.report(err);
    }
}

fn collect_handles(value: &Value, into: &mut HashSet<ComponentId>) {
    match value {
        Value::NativeHandle(id) => {
            into.insert(*id);
        }
        Value::List(items) => items.iter().for_each(|v| collect_handles(v, into)),
        Value::Dict(map) => map.values().for_each(|v| collect_handles(v, into)),
        _ => {}
    }
}
