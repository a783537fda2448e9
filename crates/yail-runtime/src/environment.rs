//! Per-screen symbol registry.

use std::rc::Rc;

use indexmap::IndexMap;
use yail_core::{ComponentId, Value};
use yail_ir::SExpr;

/// A user-defined procedure: `(def (p$name params...) body...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<SExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Component(ComponentId),
    Global(Value),
    Procedure(Rc<Procedure>),
}

/// Named bindings of one screen. Names are case-sensitive and share one flat
/// namespace; the last write wins.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: IndexMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn unbind(&mut self, name: &str) -> Option<Binding> {
        self.bindings.shift_remove(name)
    }

    /// Drop every binding. The environment stays usable.
    pub fn reset_all(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Components reachable from this environment.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.bindings.values().filter_map(|b| match b {
            Binding::Component(id) => Some(*id),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_after_reset() {
        let mut env = Environment::new();
        env.bind("X", Binding::Global(Value::from(1)));
        env.reset_all();
        assert!(env.is_empty());

        env.bind("X", Binding::Global(Value::from("v")));
        assert_eq!(env.lookup("X"), Some(&Binding::Global(Value::from("v"))));
    }

    #[test]
    fn test_last_writer_wins() {
        let mut env = Environment::new();
        let id = ComponentId::next();
        env.bind("Button1", Binding::Global(Value::from(1)));
        env.bind("Button1", Binding::Component(id));
        assert_eq!(env.lookup("Button1"), Some(&Binding::Component(id)));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut env = Environment::new();
        env.bind("g$x", Binding::Global(Value::from(1)));
        assert!(env.lookup("g$X").is_none());
    }

    #[test]
    fn test_unbind_and_components() {
        let mut env = Environment::new();
        let a = ComponentId::next();
        let b = ComponentId::next();
        env.bind("A", Binding::Component(a));
        env.bind("B", Binding::Component(b));
        env.bind("g$n", Binding::Global(Value::from(0)));

        assert_eq!(env.components().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(env.unbind("A"), Some(Binding::Component(a)));
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["B", "g$n"]);
    }
}
