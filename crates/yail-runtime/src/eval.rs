//! Tree-walking evaluation of YAIL forms.

use std::collections::HashMap;
use std::rc::Rc;

use yail_core::{ErrorKind, StructuredError, Value};
use yail_ir::{SExpr, is_special_form};

use crate::builtins;
use crate::environment::{Binding, Procedure};
use crate::interpreter::Interpreter;

/// Remaining stack below which evaluation moves to a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each stack segment allocated for deep evaluation.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Lexical frames of one evaluation, innermost last.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    frames: Vec<HashMap<String, Value>>,
}

impl Scope {
    pub(crate) fn with_frame(frame: HashMap<String, Value>) -> Self {
        Self { frames: vec![frame] }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    fn set(&mut self, name: &str, value: Value) -> bool {
        match self.frames.iter_mut().rev().find_map(|frame| frame.get_mut(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn push(&mut self, frame: HashMap<String, Value>) {
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }
}

pub(crate) fn syntax_error(form: &str, message: impl std::fmt::Display) -> StructuredError {
    StructuredError::new(ErrorKind::SyntaxError, format!("{}: {}", form, message)).with_procedure(form)
}

/// The `i`th argument of a form.
pub(crate) fn nth<'a>(form: &str, args: &'a [SExpr], i: usize) -> Result<&'a SExpr, StructuredError> {
    args.get(i)
        .ok_or_else(|| syntax_error(form, format!("missing argument {}", i + 1)))
}

pub(crate) fn symbol<'a>(form: &str, args: &'a [SExpr], i: usize) -> Result<&'a str, StructuredError> {
    nth(form, args, i)?
        .as_symbol()
        .ok_or_else(|| syntax_error(form, format!("argument {} must be a symbol", i + 1)))
}

fn unbound(name: &str) -> StructuredError {
    StructuredError::new(
        ErrorKind::UnboundVariable,
        format!("The variable {} is not bound in the current context", name),
    )
    .with_procedure(name)
}

/// Quoted data: symbols become text, lists become lists.
fn quote_value(expr: &SExpr) -> Value {
    match expr {
        SExpr::Bool(b) => Value::Bool(*b),
        SExpr::Number(n) => Value::Number(*n),
        SExpr::String(s) | SExpr::Symbol(s) => Value::Text(s.clone()),
        SExpr::List(items) => Value::List(items.iter().map(quote_value).collect()),
    }
}

impl Interpreter {
    pub(crate) fn eval(&mut self, expr: &SExpr, scope: &mut Scope) -> Result<Value, StructuredError> {
        if self.depth >= self.config.max_depth {
            return Err(StructuredError::new(
                ErrorKind::RecursionLimit,
                format!("Evaluation nested deeper than {} levels", self.config.max_depth),
            ));
        }
        self.depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, scope));
        self.depth -= 1;
        result
    }

    fn eval_inner(&mut self, expr: &SExpr, scope: &mut Scope) -> Result<Value, StructuredError> {
        match expr {
            SExpr::Bool(b) => Ok(Value::Bool(*b)),
            SExpr::Number(n) => Ok(Value::Number(*n)),
            SExpr::String(s) => Ok(Value::Text(s.clone())),
            SExpr::Symbol(name) => self.eval_symbol(name, scope),
            SExpr::List(items) => {
                let Some((head, args)) = items.split_first() else {
                    return Err(syntax_error("()", "empty form"));
                };
                let Some(name) = head.as_symbol() else {
                    return Err(syntax_error(&head.to_string(), "form head must be a symbol"));
                };
                self.eval_form(name, args, scope)
            }
        }
    }

    fn eval_symbol(&self, name: &str, scope: &Scope) -> Result<Value, StructuredError> {
        if let Some(value) = scope.get(name) {
            return Ok(value.clone());
        }
        if name == "*the-null-value*" {
            return Ok(Value::nothing());
        }
        match self.environment().and_then(|env| env.lookup(name)) {
            Some(Binding::Global(value)) => Ok(value.clone()),
            Some(Binding::Component(id)) => Ok(Value::NativeHandle(*id)),
            _ => Err(unbound(name)),
        }
    }

    pub(crate) fn eval_body(&mut self, body: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        let mut result = Value::nothing();
        for expr in body {
            result = self.eval(expr, scope)?;
        }
        Ok(result)
    }

    /// Evaluate `body` with one extra lexical frame.
    fn eval_in_frame<F>(&mut self, frame: HashMap<String, Value>, scope: &mut Scope, body: F) -> Result<Value, StructuredError>
    where
        F: FnOnce(&mut Self, &mut Scope) -> Result<Value, StructuredError>,
    {
        scope.push(frame);
        let result = body(self, scope);
        scope.pop();
        result
    }

    fn eval_form(&mut self, form: &str, args: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        match form {
            "quote" => Ok(quote_value(nth(form, args, 0)?)),

            "begin" => self.eval_body(args, scope),

            "if" => {
                let test = self.eval(nth(form, args, 0)?, scope)?;
                if test.is_true() {
                    self.eval(nth(form, args, 1)?, scope)
                } else if let Some(otherwise) = args.get(2) {
                    self.eval(otherwise, scope)
                } else {
                    Ok(Value::nothing())
                }
            }

            "and" => {
                let mut result = Value::Bool(true);
                for expr in args {
                    result = self.eval(expr, scope)?;
                    if !result.is_true() {
                        break;
                    }
                }
                Ok(result)
            }

            "or" => {
                for expr in args {
                    let value = self.eval(expr, scope)?;
                    if value.is_true() {
                        return Ok(value);
                    }
                }
                Ok(Value::Bool(false))
            }

            "let" => {
                let bindings = nth(form, args, 0)?
                    .as_list()
                    .ok_or_else(|| syntax_error(form, "expected a binding list"))?;
                let mut frame = HashMap::new();
                for binding in bindings {
                    let Some([SExpr::Symbol(name), value]) = binding.as_list() else {
                        return Err(syntax_error(form, "bindings are (name value) pairs"));
                    };
                    let value = self.eval(value, scope)?;
                    frame.insert(name.clone(), value);
                }
                self.eval_in_frame(frame, scope, |this, scope| this.eval_body(&args[1..], scope))
            }

            "lexical-value" => {
                let name = symbol(form, args, 0)?;
                scope.get(name).cloned().ok_or_else(|| unbound(name))
            }

            "set-lexical!" => {
                let name = symbol(form, args, 0)?;
                let value = self.eval(nth(form, args, 1)?, scope)?;
                if !scope.set(name, value) {
                    return Err(unbound(name));
                }
                Ok(Value::nothing())
            }

            "def" => {
                match nth(form, args, 0)? {
                    SExpr::Symbol(name) => {
                        let value = self.eval(nth(form, args, 1)?, scope)?;
                        self.current_screen_mut().environment.bind(name.clone(), Binding::Global(value));
                    }
                    SExpr::List(signature) => {
                        let names = signature
                            .iter()
                            .map(|s| s.as_symbol().map(str::to_string))
                            .collect::<Option<Vec<_>>>()
                            .ok_or_else(|| syntax_error(form, "procedure signature must be symbols"))?;
                        let Some((name, params)) = names.split_first() else {
                            return Err(syntax_error(form, "empty procedure signature"));
                        };
                        if is_special_form(name) {
                            return Err(syntax_error(form, format!("{} names a special form", name)));
                        }
                        let procedure = Procedure {
                            name: name.clone(),
                            params: params.to_vec(),
                            body: args[1..].to_vec(),
                        };
                        self.current_screen_mut()
                            .environment
                            .bind(name.clone(), Binding::Procedure(Rc::new(procedure)));
                    }
                    _ => return Err(syntax_error(form, "expected a name or a procedure signature")),
                }
                Ok(Value::nothing())
            }

            "get-var" => {
                let name = symbol(form, args, 0)?;
                match self.environment().and_then(|env| env.lookup(name)) {
                    Some(Binding::Global(value)) => Ok(value.clone()),
                    Some(Binding::Component(id)) => Ok(Value::NativeHandle(*id)),
                    _ => Err(unbound(name)),
                }
            }

            "set-var!" => {
                let name = symbol(form, args, 0)?;
                let value = self.eval(nth(form, args, 1)?, scope)?;
                self.current_screen_mut()
                    .environment
                    .bind(name.to_string(), Binding::Global(value));
                Ok(Value::nothing())
            }

            "call-procedure" => {
                let name = symbol(form, args, 0)?;
                self.call_procedure(name, &args[1..], scope)
            }

            "while" => {
                let test = nth(form, args, 0)?;
                while self.eval(test, scope)?.is_true() {
                    self.eval_body(&args[1..], scope)?;
                }
                Ok(Value::nothing())
            }

            "foreach" => {
                let var = symbol(form, args, 0)?;
                let body = nth(form, args, 1)?;
                let list = self.eval(nth(form, args, 2)?, scope)?;
                let items = match list {
                    Value::List(items) => items,
                    other => return Err(self.reporter.generate_runtime_type_error(form, &[other])),
                };
                for item in items {
                    let frame = HashMap::from([(var.to_string(), item)]);
                    self.eval_in_frame(frame, scope, |this, scope| this.eval(body, scope))?;
                }
                Ok(Value::nothing())
            }

            "forrange" => {
                let var = symbol(form, args, 0)?;
                let body = nth(form, args, 1)?;
                let mut bounds = Vec::with_capacity(3);
                for expr in &args[2..] {
                    bounds.push(self.eval(expr, scope)?);
                }
                let numbers: Option<Vec<f64>> = bounds.iter().map(|v| self.coercer.to_number(v)).collect();
                let Some([start, end, step]) = numbers.as_deref() else {
                    return Err(self.reporter.generate_runtime_type_error(form, &bounds));
                };
                let (start, end, step) = (*start, *end, *step);
                if step == 0.0 || step.is_nan() {
                    return Err(StructuredError::runtime("forrange: step must not be zero").with_procedure(form));
                }
                let mut i = start;
                while (step > 0.0 && i <= end) || (step < 0.0 && i >= end) {
                    let frame = HashMap::from([(var.to_string(), Value::Number(i))]);
                    self.eval_in_frame(frame, scope, |this, scope| this.eval(body, scope))?;
                    i += step;
                }
                Ok(Value::nothing())
            }

            "define-form" => {
                let name = symbol(form, args, 1)?;
                self.set_current_form(name);
                Ok(Value::nothing())
            }

            "add-component" => self.add_component(args, scope),
            "set-and-coerce-property!" => self.set_and_coerce_property(args, scope),
            "get-property" => self.get_property(args, scope),
            "call-component-method" => self.call_component_method(args, scope),
            "define-event" => self.define_event(args),

            "call-yail-primitive" => self.call_yail_primitive(args, scope),

            "*list-for-runtime*" => {
                let mut items = Vec::with_capacity(args.len());
                for expr in args {
                    items.push(self.eval(expr, scope)?);
                }
                Ok(Value::List(items))
            }

            "signal-runtime-error" => {
                let message = self.eval(nth(form, args, 0)?, scope)?;
                let mut err = StructuredError::runtime(self.coercer.display(&message));
                if let Some(title) = args.get(1) {
                    let title = self.eval(title, scope)?;
                    err = err.with_procedure(self.coercer.display(&title));
                }
                Err(err)
            }

            _ => self.call_named(form, args, scope),
        }
    }

    /// `(name args...)`: a user procedure if one is bound, else a builtin.
    fn call_named(&mut self, name: &str, args: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        if let Some(Binding::Procedure(_)) = self.environment().and_then(|env| env.lookup(name)) {
            return self.call_procedure(name, args, scope);
        }
        if !builtins::is_primitive(name) {
            return Err(StructuredError::new(
                ErrorKind::UnknownProcedure,
                format!("Unknown procedure {}", name),
            )
            .with_procedure(name));
        }

        let mut values = Vec::with_capacity(args.len());
        for expr in args {
            values.push(self.eval(expr, scope)?);
        }
        builtins::call_primitive(name, &values, &self.coercer)?.ok_or_else(|| {
            StructuredError::new(ErrorKind::UnknownProcedure, format!("Unknown primitive {}", name)).with_procedure(name)
        })
    }

    fn call_procedure(&mut self, name: &str, args: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        let procedure = match self.environment().and_then(|env| env.lookup(name)) {
            Some(Binding::Procedure(procedure)) => Rc::clone(procedure),
            _ => {
                return Err(StructuredError::new(
                    ErrorKind::UnknownProcedure,
                    format!("Unknown procedure {}", name),
                )
                .with_procedure(name));
            }
        };

        let mut values = Vec::with_capacity(args.len());
        for expr in args {
            values.push(self.eval(expr, scope)?);
        }
        self.invoke_procedure(&procedure, values)
    }

    /// Run a procedure body in a fresh scope holding only its parameters.
    pub(crate) fn invoke_procedure(&mut self, procedure: &Procedure, args: Vec<Value>) -> Result<Value, StructuredError> {
        if procedure.params.len() != args.len() {
            return Err(StructuredError::new(
                ErrorKind::ArityMismatch,
                format!(
                    "{} expects {} arguments, got {}",
                    procedure.name,
                    procedure.params.len(),
                    args.len()
                ),
            )
            .with_procedure(&procedure.name));
        }

        let frame = procedure.params.iter().cloned().zip(args).collect();
        let mut scope = Scope::with_frame(frame);
        self.eval_body(&procedure.body, &mut scope)
    }

    /// `(call-yail-primitive prim (*list-for-runtime* args...) '(types...) "name")`
    fn call_yail_primitive(&mut self, args: &[SExpr], scope: &mut Scope) -> Result<Value, StructuredError> {
        const FORM: &str = "call-yail-primitive";
        let primitive = symbol(FORM, args, 0)?;
        let values = self.eval(nth(FORM, args, 1)?, scope)?;
        let types = self.eval(nth(FORM, args, 2)?, scope)?;
        let label = self.eval(nth(FORM, args, 3)?, scope)?;
        let label = self.coercer.display(&label);

        let Value::List(values) = values else {
            return Err(syntax_error(FORM, "arguments must be a list"));
        };
        let tags = self.type_tags(FORM, &types)?;

        // Coerce to the declared kinds, then hand the primitive dynamic values
        let mut coerced = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            let tag = tags.get(i).copied().unwrap_or(yail_core::TypeTag::Any);
            match self.coercer.coerce(value, tag) {
                Ok(native) => coerced.push(self.coercer.lift(native)),
                Err(_) => return Err(self.reporter.generate_runtime_type_error(&label, &values)),
            }
        }

        match builtins::call_primitive(primitive, &coerced, &self.coercer) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(StructuredError::new(
                ErrorKind::UnknownProcedure,
                format!("Unknown primitive {}", primitive),
            )
            .with_procedure(label)),
            Err(err) if err.kind == ErrorKind::RuntimeTypeError => {
                Err(self.reporter.generate_runtime_type_error(&label, &values))
            }
            Err(err) => Err(err),
        }
    }
}
