//! Boolean negation and language-level equality.

use yail_core::{Coercer, StructuredError, Value};

use super::{expect_args, type_error};

pub(crate) const NAMES: &[&str] = &["not", "yail-equal?", "yail-not-equal?"];

pub fn call_logic(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    let result = match op {
        "not" => {
            expect_args(op, args, 1, 1)?;
            match &args[0] {
                Value::Bool(b) => Value::Bool(!b),
                _ => return Err(type_error(coercer, op, args)),
            }
        }
        "yail-equal?" => {
            expect_args(op, args, 2, 2)?;
            Value::Bool(coercer.equal(&args[0], &args[1]))
        }
        "yail-not-equal?" => {
            expect_args(op, args, 2, 2)?;
            Value::Bool(!coercer.equal(&args[0], &args[1]))
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}
