//! Dictionary primitives. Keys are the display text of the key value;
//! entries keep insertion order.

use indexmap::IndexMap;
use yail_core::{Coercer, StructuredError, Value};

use super::{dict_arg, expect_args, text_arg, type_error};

pub(crate) const NAMES: &[&str] = &[
    "make-yail-dictionary",
    "make-dictionary-pair",
    "yail-dictionary-lookup",
    "yail-dictionary-set-pair",
    "yail-dictionary-delete-pair",
    "yail-dictionary-get-keys",
    "yail-dictionary-get-values",
    "yail-dictionary-is-key-in",
    "yail-dictionary-length",
    "yail-dictionary?",
];

pub fn call_dict(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    let dict = |i| dict_arg(coercer, op, args, i);
    let key = |i| text_arg(coercer, op, args, i);

    let result = match op {
        // Each argument is a [key, value] pair
        "make-yail-dictionary" => {
            let mut map = IndexMap::new();
            for pair in args {
                match pair.as_list() {
                    Some([k, v]) if !k.is_non_coercible() => {
                        map.insert(coercer.display(k), v.clone());
                    }
                    _ => return Err(type_error(coercer, op, args)),
                }
            }
            Value::Dict(map)
        }

        "make-dictionary-pair" => {
            expect_args(op, args, 2, 2)?;
            Value::List(args.to_vec())
        }

        "yail-dictionary-lookup" => {
            expect_args(op, args, 3, 3)?;
            let k = key(0)?;
            dict(1)?.get(&k).cloned().unwrap_or_else(|| args[2].clone())
        }

        "yail-dictionary-set-pair" => {
            expect_args(op, args, 3, 3)?;
            let k = key(0)?;
            let mut map = dict(1)?.clone();
            map.insert(k, args[2].clone());
            Value::Dict(map)
        }

        "yail-dictionary-delete-pair" => {
            expect_args(op, args, 2, 2)?;
            let mut map = dict(0)?.clone();
            map.shift_remove(&key(1)?);
            Value::Dict(map)
        }

        "yail-dictionary-get-keys" => {
            expect_args(op, args, 1, 1)?;
            Value::List(dict(0)?.keys().map(|k| Value::Text(k.clone())).collect())
        }

        "yail-dictionary-get-values" => {
            expect_args(op, args, 1, 1)?;
            Value::List(dict(0)?.values().cloned().collect())
        }

        "yail-dictionary-is-key-in" => {
            expect_args(op, args, 2, 2)?;
            let k = key(0)?;
            Value::Bool(dict(1)?.contains_key(&k))
        }

        "yail-dictionary-length" => {
            expect_args(op, args, 1, 1)?;
            Value::Number(dict(0)?.len() as f64)
        }

        "yail-dictionary?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(matches!(args[0], Value::Dict(_)))
        }

        _ => return Ok(None),
    };

    Ok(Some(result))
}
