//! S-expression types.

use std::fmt;

/// An S-expression node.
///
/// This is the representation the evaluator walks. Quote sugar (`'x`) is
/// expanded by the reader into `(quote x)`, so there is no separate quoted
/// variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(String),
    List(Vec<SExpr>),
}

impl SExpr {
    /// Creates a number literal.
    pub fn num(value: impl Into<f64>) -> Self {
        SExpr::Number(value.into())
    }

    /// Creates a string literal.
    pub fn str(value: impl Into<String>) -> Self {
        SExpr::String(value.into())
    }

    /// Creates a symbol.
    pub fn sym(name: impl Into<String>) -> Self {
        SExpr::Symbol(name.into())
    }

    /// Creates a list.
    pub fn list(items: Vec<SExpr>) -> Self {
        SExpr::List(items)
    }

    /// Creates a form call: `(head args...)`.
    pub fn call(head: impl Into<String>, args: Vec<SExpr>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(SExpr::Symbol(head.into()));
        items.extend(args);
        SExpr::List(items)
    }

    /// Creates `(quote expr)`.
    pub fn quote(expr: SExpr) -> Self {
        SExpr::call("quote", vec![expr])
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SExpr::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SExpr::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SExpr::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            SExpr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExpr]> {
        match self {
            SExpr::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns true if this is a non-empty list headed by a symbol.
    pub fn is_call(&self) -> bool {
        self.head().is_some()
    }

    /// Returns the head symbol of a form call.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    /// Returns the arguments of a form call (everything after the head).
    pub fn args(&self) -> Option<&[SExpr]> {
        let items = self.as_list()?;
        items.first()?.as_symbol()?;
        Some(&items[1..])
    }

    /// Returns the quoted datum if this is `(quote x)`.
    pub fn unquote(&self) -> Option<&SExpr> {
        match (self.head(), self.args()) {
            (Some("quote"), Some([datum])) => Some(datum),
            _ => None,
        }
    }
}

impl From<bool> for SExpr {
    fn from(value: bool) -> Self {
        SExpr::Bool(value)
    }
}

impl From<f64> for SExpr {
    fn from(value: f64) -> Self {
        SExpr::Number(value)
    }
}

impl From<i32> for SExpr {
    fn from(value: i32) -> Self {
        SExpr::Number(value.into())
    }
}

impl From<&str> for SExpr {
    fn from(value: &str) -> Self {
        SExpr::String(value.to_string())
    }
}

impl From<String> for SExpr {
    fn from(value: String) -> Self {
        SExpr::String(value)
    }
}

impl fmt::Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Bool(true) => f.write_str("#t"),
            SExpr::Bool(false) => f.write_str("#f"),
            SExpr::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            SExpr::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        c => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
            SExpr::Symbol(s) => f.write_str(s),
            SExpr::List(items) => {
                if let Some(datum) = self.unquote() {
                    return write!(f, "'{}", datum);
                }
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str(")")
            }
        }
    }
}
