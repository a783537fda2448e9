//! The coercion engine.
//!
//! Pure conversions between [`Value`] and [`NativeValue`], the canonical
//! display string, and language-level equality. Nothing here raises: a value
//! that cannot be converted yields a [`CoercionFailure`] (the non-coercible
//! outcome) and the caller decides whether that is a user-visible error.

pub mod instant;
pub mod number;

use chrono_tz::Tz;
use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{NativeValue, TypeTag, Value};

pub use instant::{format_instant, parse_instant};
pub use number::{canonical_numeric, format_number, parse_numeric};

/// Display token for a non-coercible value.
pub const NON_COERCIBLE_TOKEN: &str = "non-coercible";

/// A value could not be converted to the requested kind.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot coerce {} to {target}", value.type_name())]
pub struct CoercionFailure {
    pub value: Value,
    pub target: TypeTag,
}

/// Conversion rules, parameterized by the time zone used for instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coercer {
    time_zone: Tz,
}

impl Default for Coercer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Coercer {
    pub fn new(time_zone: Tz) -> Self {
        Self { time_zone }
    }

    /// Create a coercer from an IANA zone name such as `Europe/Berlin`.
    pub fn with_zone_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Self::new)
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    // =========================================================================
    // Dynamic -> native
    // =========================================================================

    /// Convert a dynamic value to the native kind `target`.
    pub fn coerce(&self, value: &Value, target: TypeTag) -> Result<NativeValue, CoercionFailure> {
        let fail = || CoercionFailure {
            value: value.clone(),
            target,
        };

        let coerced = match (target, value) {
            (_, Value::NonCoercible) => None,
            (TypeTag::Any, v) => self.lower(v),
            (TypeTag::Boolean, Value::Bool(b)) => Some(NativeValue::Bool(*b)),
            (TypeTag::Boolean, Value::Text(t)) => match t.as_str() {
                "true" => Some(NativeValue::Bool(true)),
                "false" => Some(NativeValue::Bool(false)),
                _ => None,
            },
            (TypeTag::Number, v) => self.to_number(v).map(NativeValue::Float),
            (TypeTag::Integer, v) => self.to_number(v).and_then(whole_to_i64).map(NativeValue::Integer),
            (TypeTag::Text, v) => Some(NativeValue::Text(self.display(v))),
            (TypeTag::List, Value::List(items)) => self.lower_all(items).map(NativeValue::Seq),
            (TypeTag::List, Value::Dict(map)) => map
                .iter()
                .map(|(k, v)| {
                    self.lower(v)
                        .map(|v| NativeValue::Seq(vec![NativeValue::Text(k.clone()), v]))
                })
                .collect::<Option<Vec<_>>>()
                .map(NativeValue::Seq),
            (TypeTag::Dictionary, Value::Dict(map)) => self.lower_map(map).map(NativeValue::Map),
            (TypeTag::Dictionary, Value::List(items)) => self.pairs_to_map(items).map(NativeValue::Map),
            (TypeTag::Instant, Value::Instant(t)) => Some(NativeValue::Instant(*t)),
            (TypeTag::Instant, Value::Text(t)) => {
                parse_instant(t, self.time_zone).map(NativeValue::Instant)
            }
            (TypeTag::Component, Value::NativeHandle(id)) => Some(NativeValue::Component(*id)),
            _ => None,
        };

        coerced.ok_or_else(fail)
    }

    /// Numeric reading for arithmetic: numbers, or text that parses as a number.
    pub fn to_number(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => Some(*n),
            Value::Text(t) => parse_numeric(t),
            _ => None,
        }
    }

    /// Structural conversion used by the `any` kind.
    fn lower(&self, value: &Value) -> Option<NativeValue> {
        Some(match value {
            Value::Bool(b) => NativeValue::Bool(*b),
            Value::Number(n) => NativeValue::Float(*n),
            Value::Text(t) => NativeValue::Text(t.clone()),
            Value::List(items) => NativeValue::Seq(self.lower_all(items)?),
            Value::Dict(map) => NativeValue::Map(self.lower_map(map)?),
            Value::Instant(t) => NativeValue::Instant(*t),
            Value::NativeHandle(id) => NativeValue::Component(*id),
            Value::NonCoercible => return None,
        })
    }

    fn lower_all(&self, items: &[Value]) -> Option<Vec<NativeValue>> {
        items.iter().map(|item| self.lower(item)).collect()
    }

    fn lower_map(&self, map: &IndexMap<String, Value>) -> Option<IndexMap<String, NativeValue>> {
        map.iter()
            .map(|(k, v)| self.lower(v).map(|v| (k.clone(), v)))
            .collect()
    }

    /// A list of `[key, value]` pairs becomes a map.
    fn pairs_to_map(&self, items: &[Value]) -> Option<IndexMap<String, NativeValue>> {
        items
            .iter()
            .map(|pair| match pair {
                Value::List(kv) if kv.len() == 2 && !kv[0].is_non_coercible() => {
                    Some((self.display(&kv[0]), self.lower(&kv[1])?))
                }
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Native -> dynamic
    // =========================================================================

    /// Lift a native value into a dynamic value. Collections lift losslessly;
    /// opaque native objects lift to [`Value::NonCoercible`].
    pub fn lift(&self, native: NativeValue) -> Value {
        match native {
            NativeValue::Unit => Value::nothing(),
            NativeValue::Bool(b) => Value::Bool(b),
            NativeValue::Integer(i) => Value::Number(i as f64),
            NativeValue::Float(n) => Value::Number(n),
            NativeValue::Text(t) => Value::Text(t),
            NativeValue::Seq(items) => Value::List(items.into_iter().map(|v| self.lift(v)).collect()),
            NativeValue::Map(map) => {
                Value::Dict(map.into_iter().map(|(k, v)| (k, self.lift(v))).collect())
            }
            NativeValue::Instant(t) => Value::Instant(t),
            NativeValue::Component(id) => Value::NativeHandle(id),
            NativeValue::Opaque(_) => Value::NonCoercible,
        }
    }

    // =========================================================================
    // Display
    // =========================================================================

    /// The canonical display string of a value.
    ///
    /// Text renders as itself. Inside containers text is quoted, so `["a", 1]`
    /// and `[a, 1]` stay distinguishable.
    pub fn display(&self, value: &Value) -> String {
        match value {
            Value::Text(t) => t.clone(),
            other => {
                let mut out = String::new();
                self.write_display(other, &mut out);
                out
            }
        }
    }

    fn write_display(&self, value: &Value, out: &mut String) {
        match value {
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&format_number(*n)),
            Value::Text(t) => out.push_str(t),
            Value::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_element(item, out);
                }
                out.push(']');
            }
            Value::Dict(map) => {
                out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote(key));
                    out.push_str(": ");
                    self.write_element(item, out);
                }
                out.push('}');
            }
            Value::Instant(t) => out.push_str(&format_instant(t, self.time_zone)),
            Value::NativeHandle(id) => out.push_str(&format!("#<component {}>", id)),
            Value::NonCoercible => out.push_str(NON_COERCIBLE_TOKEN),
        }
    }

    fn write_element(&self, value: &Value, out: &mut String) {
        match value {
            Value::Text(t) => out.push_str(&quote(t)),
            Value::Instant(t) => out.push_str(&quote(&format_instant(t, self.time_zone))),
            other => self.write_display(other, out),
        }
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Language-level equality.
    ///
    /// In order: booleans compare directly; if both sides have a numeric
    /// reading they compare as numbers; lists compare element-wise; anything
    /// else compares by display text. A container is never equal to a scalar.
    pub fn equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::NonCoercible, Value::NonCoercible) => return true,
            (Value::NonCoercible, _) | (_, Value::NonCoercible) => return false,
            (Value::Bool(x), Value::Bool(y)) => return x == y,
            _ => {}
        }

        if let (Some(x), Some(y)) = (equality_number(a), equality_number(b)) {
            return x == y;
        }

        match (a, b) {
            (Value::List(xs), Value::List(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.equal(x, y))
            }
            (Value::Dict(xs), Value::Dict(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .all(|(k, x)| ys.get(k).is_some_and(|y| self.equal(x, y)))
            }
            (Value::List(_) | Value::Dict(_), _) | (_, Value::List(_) | Value::Dict(_)) => false,
            (Value::Instant(x), Value::Instant(y)) => x == y,
            (Value::NativeHandle(x), Value::NativeHandle(y)) => x == y,
            _ => self.display(a) == self.display(b),
        }
    }
}

fn equality_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Text(t) => canonical_numeric(t),
        _ => None,
    }
}

fn whole_to_i64(n: f64) -> Option<i64> {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}
