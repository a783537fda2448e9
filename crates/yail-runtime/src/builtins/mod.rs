//! Builtin primitive libraries.
//!
//! Each library exposes `call_<lib>(op, args, coercer)`, returning `Ok(None)`
//! when it does not know `op`. Libraries are tried in order.

mod dict;
mod list;
mod logic;
mod math;
mod text;
mod time;

use indexmap::IndexMap;
use yail_core::{Coercer, ErrorKind, NativeValue, StructuredError, TypeTag, Value, generate_runtime_type_error};

/// Call a builtin primitive. Returns `Ok(None)` if no library defines `op`.
pub fn call_primitive(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    if let Some(result) = math::call_math(op, args, coercer)? {
        return Ok(Some(result));
    }
    if let Some(result) = logic::call_logic(op, args, coercer)? {
        return Ok(Some(result));
    }
    if let Some(result) = text::call_text(op, args, coercer)? {
        return Ok(Some(result));
    }
    if let Some(result) = list::call_list(op, args, coercer)? {
        return Ok(Some(result));
    }
    if let Some(result) = dict::call_dict(op, args, coercer)? {
        return Ok(Some(result));
    }
    if let Some(result) = time::call_time(op, args, coercer)? {
        return Ok(Some(result));
    }
    Ok(None)
}

/// Returns true if some library defines `op`.
pub fn is_primitive(op: &str) -> bool {
    [
        math::NAMES,
        logic::NAMES,
        text::NAMES,
        list::NAMES,
        dict::NAMES,
        time::NAMES,
    ]
    .iter()
    .any(|names| names.contains(&op))
}

// =============================================================================
// Argument helpers shared by the libraries
// =============================================================================

pub(crate) fn type_error(coercer: &Coercer, op: &str, args: &[Value]) -> StructuredError {
    generate_runtime_type_error(coercer, op, args)
}

pub(crate) fn expect_args(op: &str, args: &[Value], min: usize, max: usize) -> Result<(), StructuredError> {
    if args.len() >= min && args.len() <= max {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {}", min)
    } else {
        format!("{} to {}", min, max)
    };
    Err(StructuredError::new(
        ErrorKind::ArityMismatch,
        format!("{} expects {} arguments, got {}", op, expected, args.len()),
    )
    .with_procedure(op))
}

pub(crate) fn number_arg(coercer: &Coercer, op: &str, args: &[Value], i: usize) -> Result<f64, StructuredError> {
    coercer
        .to_number(&args[i])
        .ok_or_else(|| type_error(coercer, op, args))
}

pub(crate) fn numbers(coercer: &Coercer, op: &str, args: &[Value]) -> Result<Vec<f64>, StructuredError> {
    (0..args.len()).map(|i| number_arg(coercer, op, args, i)).collect()
}

/// Text reading of an argument: any value except non-coercible, by display.
pub(crate) fn text_arg(coercer: &Coercer, op: &str, args: &[Value], i: usize) -> Result<String, StructuredError> {
    if args[i].is_non_coercible() {
        return Err(type_error(coercer, op, args));
    }
    Ok(coercer.display(&args[i]))
}

pub(crate) fn list_arg<'a>(
    coercer: &Coercer,
    op: &str,
    args: &'a [Value],
    i: usize,
) -> Result<&'a [Value], StructuredError> {
    args[i].as_list().ok_or_else(|| type_error(coercer, op, args))
}

pub(crate) fn dict_arg<'a>(
    coercer: &Coercer,
    op: &str,
    args: &'a [Value],
    i: usize,
) -> Result<&'a IndexMap<String, Value>, StructuredError> {
    args[i].as_dict().ok_or_else(|| type_error(coercer, op, args))
}

/// Numbers that are whole and fit in `i64`, as list indices and the like.
pub(crate) fn integer_arg(coercer: &Coercer, op: &str, args: &[Value], i: usize) -> Result<i64, StructuredError> {
    match coercer.coerce(&args[i], TypeTag::Integer) {
        Ok(NativeValue::Integer(n)) => Ok(n),
        _ => Err(type_error(coercer, op, args)),
    }
}

#[cfg(test)]
mod tests;
