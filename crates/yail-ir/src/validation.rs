//! S-expression validation.

use crate::SExpr;
use crate::reader::MAX_NESTING;
use thiserror::Error;

/// Errors that can occur during validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid argument count for {form}: expected {expected}, got {got}")]
    InvalidArgCount {
        form: String,
        expected: String,
        got: usize,
    },

    #[error("invalid argument for {form} at position {position}: expected {expected}")]
    InvalidArgType {
        form: String,
        position: usize,
        expected: String,
    },

    #[error("empty form call")]
    EmptyCall,

    #[error("form head must be a symbol, got {0}")]
    InvalidHead(String),

    #[error("forms nested deeper than {} levels", MAX_NESTING)]
    TooDeep,
}

/// Validate an S-expression for structural correctness.
///
/// This checks the shape of special forms (arity, binding lists, symbol
/// positions) and recursively validates evaluated sub-forms. Quoted data is
/// not inspected.
///
/// Note: This does NOT check that primitives or components exist. That
/// requires the runtime's registries and is reported at evaluation time.
pub fn validate(expr: &SExpr) -> Result<(), ValidationError> {
    validate_at(expr, 0)
}

fn validate_at(expr: &SExpr, depth: usize) -> Result<(), ValidationError> {
    let Some(items) = expr.as_list() else {
        return Ok(());
    };
    if depth >= MAX_NESTING {
        return Err(ValidationError::TooDeep);
    }
    let Some(first) = items.first() else {
        return Err(ValidationError::EmptyCall);
    };
    let Some(head) = first.as_symbol() else {
        return Err(ValidationError::InvalidHead(first.to_string()));
    };
    let args = &items[1..];

    match head {
        "quote" => expect_count(head, args, 1, 1),
        "if" => {
            expect_count(head, args, 2, 3)?;
            validate_all(args, depth + 1)
        }
        "lexical-value" | "get-var" => {
            expect_count(head, args, 1, 1)?;
            expect_symbol(head, args, 0)
        }
        "set-lexical!" | "set-var!" => {
            expect_count(head, args, 2, 2)?;
            expect_symbol(head, args, 0)?;
            validate_at(&args[1], depth + 1)
        }
        "def" => {
            expect_count(head, args, 2, usize::MAX)?;
            match &args[0] {
                SExpr::Symbol(_) => {
                    expect_count(head, args, 2, 2)?;
                    validate_at(&args[1], depth + 1)
                }
                SExpr::List(signature) if !signature.is_empty() => {
                    expect_symbol_list(head, signature, 0)?;
                    validate_all(&args[1..], depth + 1)
                }
                _ => Err(ValidationError::InvalidArgType {
                    form: head.to_string(),
                    position: 0,
                    expected: "symbol or procedure signature".to_string(),
                }),
            }
        }
        "let" => {
            expect_count(head, args, 1, usize::MAX)?;
            let Some(bindings) = args[0].as_list() else {
                return Err(binding_list_error(head));
            };
            for binding in bindings {
                match binding.as_list() {
                    Some([SExpr::Symbol(_), value]) => validate_at(value, depth + 1)?,
                    _ => return Err(binding_list_error(head)),
                }
            }
            validate_all(&args[1..], depth + 1)
        }
        "while" => {
            expect_count(head, args, 1, usize::MAX)?;
            validate_all(args, depth + 1)
        }
        "foreach" => {
            expect_count(head, args, 3, 3)?;
            expect_symbol(head, args, 0)?;
            validate_all(&args[1..], depth + 1)
        }
        "forrange" => {
            expect_count(head, args, 5, 5)?;
            expect_symbol(head, args, 0)?;
            validate_all(&args[1..], depth + 1)
        }
        "define-form" => {
            expect_count(head, args, 2, 2)?;
            expect_symbol(head, args, 1)
        }
        "add-component" => {
            expect_count(head, args, 3, usize::MAX)?;
            expect_symbol(head, args, 0)?;
            expect_symbol(head, args, 1)?;
            expect_symbol(head, args, 2)?;
            validate_all(&args[3..], depth + 1)
        }
        "define-event" => {
            expect_count(head, args, 3, usize::MAX)?;
            expect_symbol(head, args, 0)?;
            expect_symbol(head, args, 1)?;
            let Some(params) = args[2].as_list() else {
                return Err(ValidationError::InvalidArgType {
                    form: head.to_string(),
                    position: 2,
                    expected: "parameter list".to_string(),
                });
            };
            expect_symbol_list(head, params, 2)?;
            validate_all(&args[3..], depth + 1)
        }
        "call-yail-primitive" => {
            expect_count(head, args, 4, 4)?;
            expect_symbol(head, args, 0)?;
            validate_all(&args[1..], depth + 1)
        }
        "call-component-method" => {
            expect_count(head, args, 4, 4)?;
            validate_all(args, depth + 1)
        }
        "set-and-coerce-property!" => {
            expect_count(head, args, 4, 4)?;
            validate_all(args, depth + 1)
        }
        "get-property" => {
            expect_count(head, args, 2, 2)?;
            validate_all(args, depth + 1)
        }
        "call-procedure" => {
            expect_count(head, args, 1, usize::MAX)?;
            expect_symbol(head, args, 0)?;
            validate_all(&args[1..], depth + 1)
        }
        "signal-runtime-error" => {
            expect_count(head, args, 1, 2)?;
            validate_all(args, depth + 1)
        }
        _ => validate_all(args, depth + 1),
    }
}

fn validate_all(exprs: &[SExpr], depth: usize) -> Result<(), ValidationError> {
    for expr in exprs {
        validate_at(expr, depth)?;
    }
    Ok(())
}

fn expect_count(form: &str, args: &[SExpr], min: usize, max: usize) -> Result<(), ValidationError> {
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
    Err(ValidationError::InvalidArgCount {
        form: form.to_string(),
        expected,
        got: args.len(),
    })
}

fn expect_symbol(form: &str, args: &[SExpr], position: usize) -> Result<(), ValidationError> {
    if args[position].as_symbol().is_some() {
        Ok(())
    } else {
        Err(ValidationError::InvalidArgType {
            form: form.to_string(),
            position,
            expected: "symbol".to_string(),
        })
    }
}

fn expect_symbol_list(form: &str, items: &[SExpr], position: usize) -> Result<(), ValidationError> {
    if items.iter().all(|item| item.as_symbol().is_some()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidArgType {
            form: form.to_string(),
            position,
            expected: "list of symbols".to_string(),
        })
    }
}

fn binding_list_error(form: &str) -> ValidationError {
    ValidationError::InvalidArgType {
        form: form.to_string(),
        position: 0,
        expected: "list of (name value) bindings".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_one;

    #[test]
    fn test_validate_literals() {
        assert!(validate(&SExpr::Bool(true)).is_ok());
        assert!(validate(&SExpr::num(42)).is_ok());
        assert!(validate(&SExpr::str("hello")).is_ok());
        assert!(validate(&SExpr::sym("g$x")).is_ok());
    }

    #[test]
    fn test_validate_nested() {
        let expr = read_one("(begin (def g$x 10) (if (> (get-var g$x) 5) \"big\" \"small\"))").unwrap();
        assert!(validate(&expr).is_ok());
    }

    #[test]
    fn test_quoted_data_is_not_checked() {
        let expr = read_one("'(1 2 ())").unwrap();
        assert!(validate(&expr).is_ok());
    }

    #[test]
    fn test_empty_call() {
        let expr = read_one("(begin ())").unwrap();
        assert_eq!(validate(&expr), Err(ValidationError::EmptyCall));
    }

    #[test]
    fn test_bad_if_arity() {
        let expr = read_one("(if #t)").unwrap();
        assert!(matches!(
            validate(&expr),
            Err(ValidationError::InvalidArgCount { got: 1, .. })
        ));
    }

    #[test]
    fn test_bad_let_bindings() {
        let expr = read_one("(let (x 1) x)").unwrap();
        assert!(matches!(
            validate(&expr),
            Err(ValidationError::InvalidArgType { position: 0, .. })
        ));
    }

    #[test]
    fn test_define_event_params_must_be_symbols() {
        let expr = read_one("(define-event Button1 Click (1) #t)").unwrap();
        assert!(validate(&expr).is_err());

        let expr = read_one("(define-event Button1 Click (x y) #t)").unwrap();
        assert!(validate(&expr).is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let nest = |levels: usize| {
            (0..levels).fold(SExpr::num(1), |inner, _| SExpr::List(vec![SExpr::sym("begin"), inner]))
        };
        assert!(validate(&nest(MAX_NESTING)).is_ok());
        assert_eq!(validate(&nest(MAX_NESTING + 500)), Err(ValidationError::TooDeep));
    }

    #[test]
    fn test_non_symbol_head() {
        let expr = read_one("(1 2)").unwrap();
        assert_eq!(validate(&expr), Err(ValidationError::InvalidHead("1".to_string())));
    }
}
