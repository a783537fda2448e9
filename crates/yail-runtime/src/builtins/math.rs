//! Arithmetic and numeric comparison.

use yail_core::{Coercer, StructuredError, Value};

use super::{expect_args, number_arg, numbers};

pub(crate) const NAMES: &[&str] = &[
    "+", "-", "*", "/", "quotient", "remainder", "modulo", "expt", "abs", "min", "max", "sqrt", "floor",
    "ceiling", "round", "<", ">", "<=", ">=", "=",
];

/// Call math primitives. Returns None if op doesn't match.
pub fn call_math(op: &str, args: &[Value], coercer: &Coercer) -> Result<Option<Value>, StructuredError> {
    let result = match op {
        "+" => Value::Number(numbers(coercer, op, args)?.iter().sum()),
        "*" => Value::Number(numbers(coercer, op, args)?.iter().product()),

        "-" => {
            expect_args(op, args, 1, usize::MAX)?;
            let ns = numbers(coercer, op, args)?;
            Value::Number(match ns.as_slice() {
                [only] => -only,
                _ => ns[1..].iter().fold(ns[0], |acc, n| acc - n),
            })
        }

        // IEEE division: 1/0 is +infinity, 0/0 is NaN
        "/" => {
            expect_args(op, args, 1, usize::MAX)?;
            let ns = numbers(coercer, op, args)?;
            Value::Number(match ns.as_slice() {
                [only] => 1.0 / only,
                _ => ns[1..].iter().fold(ns[0], |acc, n| acc / n),
            })
        }

        "quotient" | "remainder" | "modulo" => {
            expect_args(op, args, 2, 2)?;
            let a = number_arg(coercer, op, args, 0)?;
            let b = number_arg(coercer, op, args, 1)?;
            if b == 0.0 {
                return Err(StructuredError::runtime(format!("{}: division by zero", op)).with_procedure(op));
            }
            Value::Number(match op {
                "quotient" => (a / b).trunc(),
                // Sign follows the dividend
                "remainder" => a % b,
                // Sign follows the divisor
                _ => ((a % b) + b) % b,
            })
        }

        "expt" => {
            expect_args(op, args, 2, 2)?;
            let base = number_arg(coercer, op, args, 0)?;
            let exponent = number_arg(coercer, op, args, 1)?;
            Value::Number(base.powf(exponent))
        }

        "abs" | "sqrt" | "floor" | "ceiling" | "round" => {
            expect_args(op, args, 1, 1)?;
            let n = number_arg(coercer, op, args, 0)?;
            Value::Number(match op {
                "abs" => n.abs(),
                "sqrt" => n.sqrt(),
                "floor" => n.floor(),
                "ceiling" => n.ceil(),
                _ => n.round_ties_even(),
            })
        }

        "min" | "max" => {
            expect_args(op, args, 1, usize::MAX)?;
            let ns = numbers(coercer, op, args)?;
            let pick = if op == "min" { f64::min } else { f64::max };
            Value::Number(ns[1..].iter().fold(ns[0], |acc, n| pick(acc, *n)))
        }

        "<" | ">" | "<=" | ">=" | "=" => {
            expect_args(op, args, 1, usize::MAX)?;
            let ns = numbers(coercer, op, args)?;
            let holds = |a: f64, b: f64| match op {
                "<" => a < b,
                ">" => a > b,
                "<=" => a <= b,
                ">=" => a >= b,
                _ => a == b,
            };
            Value::Bool(ns.windows(2).all(|pair| holds(pair[0], pair[1])))
        }

        _ => return Ok(None),
    };

    Ok(Some(result))
}
