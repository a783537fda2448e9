//! Dynamic and native value types.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identity of a native component instance.
///
/// Identity is allocated once per instance and never reused, so two
/// components with identical state are still distinct event targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate a new unique component ID.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value that can cross the interpreter/native boundary.
///
/// The derived `PartialEq` is structural. Language-level equality, which
/// compares numeric text with numbers, is [`crate::Coercer::equal`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Instant(DateTime<Utc>),
    NativeHandle(ComponentId),
    /// Result of a failed coercion. Never the same thing as `false` or empty.
    NonCoercible,
}

impl Value {
    /// The value of a statement or a procedure without a result.
    pub fn nothing() -> Self {
        Value::Text(String::new())
    }

    /// YAIL truthiness: everything except `false` is true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn is_non_coercible(&self) -> bool {
        matches!(self, Value::NonCoercible)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Name of the value's kind, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
            Value::Instant(_) => "InstantInTime",
            Value::NativeHandle(_) => "component",
            Value::NonCoercible => "non-coercible",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<ComponentId> for Value {
    fn from(value: ComponentId) -> Self {
        Value::NativeHandle(value)
    }
}

/// A typed value on the native side of the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    /// Result of a method with no return value.
    Unit,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Seq(Vec<NativeValue>),
    Map(IndexMap<String, NativeValue>),
    Instant(DateTime<Utc>),
    Component(ComponentId),
    /// A native object with no dynamic representation; lifts to
    /// [`Value::NonCoercible`]. The string is a debug description.
    Opaque(String),
}

/// Target kinds for coercion, spelled the way YAIL type lists spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "dictionary")]
    Dictionary,
    #[serde(rename = "InstantInTime")]
    Instant,
    #[serde(rename = "component")]
    Component,
    #[serde(rename = "any")]
    Any,
}

impl TypeTag {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Text => "text",
            TypeTag::List => "list",
            TypeTag::Dictionary => "dictionary",
            TypeTag::Instant => "InstantInTime",
            TypeTag::Component => "component",
            TypeTag::Any => "any",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown type tag: {0}")]
pub struct UnknownTypeTag(pub String);

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(TypeTag::Boolean),
            "number" => Ok(TypeTag::Number),
            "integer" => Ok(TypeTag::Integer),
            "text" => Ok(TypeTag::Text),
            "list" => Ok(TypeTag::List),
            "dictionary" => Ok(TypeTag::Dictionary),
            "InstantInTime" => Ok(TypeTag::Instant),
            "component" => Ok(TypeTag::Component),
            // Dictionary keys are accepted as-is
            "any" | "key" => Ok(TypeTag::Any),
            other => Err(UnknownTypeTag(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_ids_are_unique() {
        let a = ComponentId::next();
        let b = ComponentId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Bool(false).is_true());
        assert!(Value::Bool(true).is_true());
        assert!(Value::Number(0.0).is_true());
        assert!(Value::nothing().is_true());
        assert!(Value::NonCoercible.is_true());
    }

    #[test]
    fn test_type_tag_parsing() {
        assert_eq!("number".parse::<TypeTag>(), Ok(TypeTag::Number));
        assert_eq!("InstantInTime".parse::<TypeTag>(), Ok(TypeTag::Instant));
        assert_eq!("key".parse::<TypeTag>(), Ok(TypeTag::Any));
        assert!("Number".parse::<TypeTag>().is_err());
        for tag in [TypeTag::Boolean, TypeTag::Dictionary, TypeTag::Component] {
            assert_eq!(tag.as_str().parse::<TypeTag>(), Ok(tag));
        }
    }
}
