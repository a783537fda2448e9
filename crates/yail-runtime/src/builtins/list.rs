//! List primitives. Lists are values: operations that change a list return
//! the changed list. Indices are 1-based.

use yail_core::{Coercer, StructuredError, Value};

use super::{expect_args, integer_arg, list_arg, text_arg, type_error};

pub(crate) const NAMES: &[&str] = &[
    "make-yail-list",
    "yail-list-length",
    "yail-list-get-item",
    "yail-list-empty?",
    "yail-list-member?",
    "yail-list-index",
    "yail-list-append",
    "yail-list-reverse",
    "yail-list-join-with-separator",
    "is-list?",
];

pub fn call_list(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    let list = |i| list_arg(coercer, op, args, i);

    let result = match op {
        "make-yail-list" => Value::List(args.to_vec()),

        "yail-list-length" => {
            expect_args(op, args, 1, 1)?;
            Value::Number(list(0)?.len() as f64)
        }

        "yail-list-get-item" => {
            expect_args(op, args, 2, 2)?;
            let items = list(0)?;
            let index = integer_arg(coercer, op, args, 1)?;
            if index < 1 || index as usize > items.len() {
                return Err(StructuredError::runtime(format!(
                    "Select list item: Attempt to get item number {} of a list of length {}",
                    index,
                    items.len()
                ))
                .with_procedure(op));
            }
            items[index as usize - 1].clone()
        }

        "yail-list-empty?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(list(0)?.is_empty())
        }

        "yail-list-member?" => {
            expect_args(op, args, 2, 2)?;
            let items = list(1)?;
            Value::Bool(items.iter().any(|item| coercer.equal(&args[0], item)))
        }

        // 1-based position of the first equal item, 0 when absent
        "yail-list-index" => {
            expect_args(op, args, 2, 2)?;
            let items = list(1)?;
            let position = items
                .iter()
                .position(|item| coercer.equal(&args[0], item))
                .map_or(0, |i| i + 1);
            Value::Number(position as f64)
        }

        "yail-list-append" => {
            expect_args(op, args, 2, 2)?;
            let mut joined = list(0)?.to_vec();
            joined.extend_from_slice(list(1)?);
            Value::List(joined)
        }

        "yail-list-reverse" => {
            expect_args(op, args, 1, 1)?;
            Value::List(list(0)?.iter().rev().cloned().collect())
        }

        "yail-list-join-with-separator" => {
            expect_args(op, args, 2, 2)?;
            let items = list(0)?;
            let separator = text_arg(coercer, op, args, 1)?;
            if items.iter().any(Value::is_non_coercible) {
                return Err(type_error(coercer, op, args));
            }
            let parts: Vec<String> = items.iter().map(|item| coercer.display(item)).collect();
            Value::Text(parts.join(&separator))
        }

        "is-list?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(matches!(args[0], Value::List(_)))
        }

        _ => return Ok(None),
    };

    Ok(Some(result))
}
