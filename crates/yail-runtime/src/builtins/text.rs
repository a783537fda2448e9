//! Text primitives. Positions are 1-based and count characters.

use yail_core::{Coercer, StructuredError, Value};

use super::{expect_args, integer_arg, text_arg, type_error};

pub(crate) const NAMES: &[&str] = &[
    "string-append",
    "string-length",
    "string-upcase",
    "string-downcase",
    "string-trim",
    "string-contains",
    "string-starts-at",
    "string-substring",
    "string-empty?",
    "string-replace-all",
    "coerce-to-string",
    "coerce-to-number",
    "is-number?",
    "is-string?",
    "is-boolean?",
];

pub fn call_text(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    let text = |i| text_arg(coercer, op, args, i);

    let result = match op {
        "string-append" => {
            let mut out = String::new();
            for i in 0..args.len() {
                out.push_str(&text(i)?);
            }
            Value::Text(out)
        }

        "string-length" => {
            expect_args(op, args, 1, 1)?;
            Value::Number(text(0)?.chars().count() as f64)
        }

        "string-upcase" | "string-downcase" | "string-trim" => {
            expect_args(op, args, 1, 1)?;
            let s = text(0)?;
            Value::Text(match op {
                "string-upcase" => s.to_uppercase(),
                "string-downcase" => s.to_lowercase(),
                _ => s.trim().to_string(),
            })
        }

        "string-contains" => {
            expect_args(op, args, 2, 2)?;
            Value::Bool(text(0)?.contains(text(1)?.as_str()))
        }

        // 1-based character position of the first match, 0 when absent
        "string-starts-at" => {
            expect_args(op, args, 2, 2)?;
            let haystack = text(0)?;
            let needle = text(1)?;
            let position = haystack
                .find(needle.as_str())
                .map_or(0, |byte| haystack[..byte].chars().count() + 1);
            Value::Number(position as f64)
        }

        "string-substring" => {
            expect_args(op, args, 3, 3)?;
            let s = text(0)?;
            let start = integer_arg(coercer, op, args, 1)?;
            let length = integer_arg(coercer, op, args, 2)?;
            let len = s.chars().count() as i64;
            if start < 1 || start > len + 1 || length < 0 || length > len - (start - 1) {
                return Err(StructuredError::runtime(format!(
                    "Segment: start ({}) and length ({}) are outside the text of length {}",
                    start, length, len
                ))
                .with_procedure(op));
            }
            Value::Text(s.chars().skip((start - 1) as usize).take(length as usize).collect())
        }

        "string-empty?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(text(0)?.is_empty())
        }

        "string-replace-all" => {
            expect_args(op, args, 3, 3)?;
            let target = text(1)?;
            if target.is_empty() {
                return Err(type_error(coercer, op, args));
            }
            Value::Text(text(0)?.replace(target.as_str(), &text(2)?))
        }

        "coerce-to-string" => {
            expect_args(op, args, 1, 1)?;
            match &args[0] {
                Value::NonCoercible => Value::NonCoercible,
                other => Value::Text(coercer.display(other)),
            }
        }

        // Produces the non-coercible sentinel instead of failing
        "coerce-to-number" => {
            expect_args(op, args, 1, 1)?;
            coercer.to_number(&args[0]).map_or(Value::NonCoercible, Value::Number)
        }

        "is-number?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(coercer.to_number(&args[0]).is_some())
        }

        "is-string?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(matches!(args[0], Value::Text(_)))
        }

        "is-boolean?" => {
            expect_args(op, args, 1, 1)?;
            Value::Bool(matches!(args[0], Value::Bool(_)))
        }

        _ => return Ok(None),
    };

    Ok(Some(result))
}
