//! Instant primitives, in the coercer's time zone.

use chrono::{DateTime, Duration, Utc};
use yail_core::{Coercer, NativeValue, StructuredError, TypeTag, Value};

use super::{expect_args, number_arg, type_error};

pub(crate) const NAMES: &[&str] = &[
    "yail-parse-instant",
    "yail-format-instant",
    "yail-instant-add-seconds",
    "yail-instant-seconds-between",
    "yail-instant-now",
];

pub fn call_time(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    let instant = |i: usize| -> Result<DateTime<Utc>, StructuredError> {
        match coercer.coerce(&args[i], TypeTag::Instant) {
            Ok(NativeValue::Instant(t)) => Ok(t),
            _ => Err(type_error(coercer, op, args)),
        }
    };

    let result = match op {
        "yail-parse-instant" => {
            expect_args(op, args, 1, 1)?;
            Value::Instant(instant(0)?)
        }

        "yail-format-instant" => {
            expect_args(op, args, 1, 1)?;
            Value::Text(coercer.display(&Value::Instant(instant(0)?)))
        }

        "yail-instant-add-seconds" => {
            expect_args(op, args, 2, 2)?;
            let start = instant(0)?;
            let seconds = number_arg(coercer, op, args, 1)?;
            let millis = (seconds * 1000.0).round();
            if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
                return Err(type_error(coercer, op, args));
            }
            let shifted = Duration::try_milliseconds(millis as i64)
                .and_then(|delta| start.checked_add_signed(delta))
                .ok_or_else(|| type_error(coercer, op, args))?;
            Value::Instant(shifted)
        }

        // Seconds from the first instant to the second
        "yail-instant-seconds-between" => {
            expect_args(op, args, 2, 2)?;
            let from = instant(0)?;
            let to = instant(1)?;
            Value::Number((to - from).num_milliseconds() as f64 / 1000.0)
        }

        "yail-instant-now" => {
            expect_args(op, args, 0, 0)?;
            Value::Instant(Utc::now())
        }

        _ => return Ok(None),
    };

    Ok(Some(result))
}
