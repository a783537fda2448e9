//! Special form names understood by the evaluator.

/// Forms that are evaluated by the runtime itself rather than dispatched to
/// a builtin primitive.
pub const SPECIAL_FORMS: &[&str] = &[
    "quote",
    "begin",
    "if",
    "and",
    "or",
    "let",
    "lexical-value",
    "set-lexical!",
    "def",
    "get-var",
    "set-var!",
    "call-procedure",
    "while",
    "foreach",
    "forrange",
    "define-form",
    "add-component",
    "set-and-coerce-property!",
    "get-property",
    "call-component-method",
    "define-event",
    "call-yail-primitive",
    "*list-for-runtime*",
    "signal-runtime-error",
];

/// Returns true if `name` is one of [`SPECIAL_FORMS`].
pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_special_form() {
        assert!(is_special_form("if"));
        assert!(is_special_form("define-event"));
        assert!(is_special_form("call-yail-primitive"));
        assert!(!is_special_form("+"));
        assert!(!is_special_form("string-append"));
    }
}
