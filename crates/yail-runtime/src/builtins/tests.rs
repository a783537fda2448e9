use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

use super::*;

fn call(op: &str, args: Vec<Value>) -> Result<Value, StructuredError> {
    call_primitive(op, &args, &Coercer::default()).map(|v| v.expect("known primitive"))
}

fn display(value: &Value) -> String {
    Coercer::default().display(value)
}

#[test]
fn test_every_name_is_callable() {
    for names in [
        math::NAMES,
        logic::NAMES,
        text::NAMES,
        list::NAMES,
        dict::NAMES,
        time::NAMES,
    ] {
        for name in names {
            assert!(is_primitive(name));
            // Wrong argument shapes may fail, but the name must be recognized
            let known = call_primitive(name, &[], &Coercer::default()).map(|v| v.is_some());
            assert!(!matches!(known, Ok(false)), "{name} not dispatched");
        }
    }
    assert!(!is_primitive("launch-rockets"));
    assert_eq!(call_primitive("launch-rockets", &[], &Coercer::default()), Ok(None));
}

// =============================================================================
// math
// =============================================================================

#[test]
fn test_arithmetic() {
    assert_eq!(call("+", vec![1.into(), "2".into(), 3.5.into()]), Ok(Value::Number(6.5)));
    assert_eq!(call("+", vec![]), Ok(Value::Number(0.0)));
    assert_eq!(call("*", vec![2.into(), 4.into()]), Ok(Value::Number(8.0)));
    assert_eq!(call("-", vec![5.into()]), Ok(Value::Number(-5.0)));
    assert_eq!(call("-", vec![10.into(), 3.into(), 2.into()]), Ok(Value::Number(5.0)));
}

#[test]
fn test_ieee_division() {
    assert_eq!(display(&call("/", vec![1.0.into(), 0.into()]).unwrap()), "+infinity");
    assert_eq!(display(&call("/", vec![(-1.0).into(), 0.into()]).unwrap()), "-infinity");
    assert_eq!(call("/", vec![7.into(), 2.into()]), Ok(Value::Number(3.5)));
}

#[test]
fn test_integer_division() {
    assert_eq!(call("quotient", vec![(-7).into(), 2.into()]), Ok(Value::Number(-3.0)));
    assert_eq!(call("remainder", vec![(-7).into(), 2.into()]), Ok(Value::Number(-1.0)));
    assert_eq!(call("modulo", vec![(-7).into(), 2.into()]), Ok(Value::Number(1.0)));
    let err = call("modulo", vec![1.into(), 0.into()]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
}

#[test]
fn test_rounding_and_extrema() {
    assert_eq!(call("round", vec![2.5.into()]), Ok(Value::Number(2.0)));
    assert_eq!(call("round", vec![3.5.into()]), Ok(Value::Number(4.0)));
    assert_eq!(call("floor", vec![(-1.5).into()]), Ok(Value::Number(-2.0)));
    assert_eq!(call("ceiling", vec![1.2.into()]), Ok(Value::Number(2.0)));
    assert_eq!(call("max", vec![1.into(), 9.into(), 4.into()]), Ok(Value::Number(9.0)));
    assert_eq!(call("min", vec![1.into(), (-9).into()]), Ok(Value::Number(-9.0)));
    assert_eq!(call("expt", vec![2.into(), 10.into()]), Ok(Value::Number(1024.0)));
}

#[test]
fn test_comparisons_chain() {
    assert_eq!(call("<", vec![1.into(), 2.into(), 3.into()]), Ok(Value::Bool(true)));
    assert_eq!(call("<", vec![1.into(), 3.into(), 2.into()]), Ok(Value::Bool(false)));
    assert_eq!(call("=", vec![1.into(), "1.0".into()]), Ok(Value::Bool(true)));
    assert_eq!(call(">=", vec![2.into(), 2.into()]), Ok(Value::Bool(true)));
}

#[test]
fn test_math_type_error_names_operation() {
    let err = call("+", vec![1.into(), "apple".into()]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeTypeError);
    assert_eq!(err.reason, "The operation + cannot accept the arguments: , [1], [apple]");
}

#[test]
fn test_arity_mismatch() {
    let err = call("sqrt", vec![]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
}

// =============================================================================
// logic
// =============================================================================

#[test]
fn test_logic() {
    assert_eq!(call("not", vec![false.into()]), Ok(Value::Bool(true)));
    assert!(call("not", vec![0.into()]).is_err());
    assert_eq!(call("yail-equal?", vec![0.into(), " 0 ".into()]), Ok(Value::Bool(true)));
    assert_eq!(call("yail-not-equal?", vec![0.into(), "01".into()]), Ok(Value::Bool(true)));
}

// =============================================================================
// text
// =============================================================================

#[test]
fn test_text_basics() {
    assert_eq!(
        call("string-append", vec!["a".into(), 1.into(), true.into()]),
        Ok(Value::from("a1true"))
    );
    assert_eq!(call("string-length", vec!["héllo".into()]), Ok(Value::Number(5.0)));
    assert_eq!(call("string-upcase", vec!["abc".into()]), Ok(Value::from("ABC")));
    assert_eq!(call("string-trim", vec!["  x ".into()]), Ok(Value::from("x")));
    assert_eq!(call("string-empty?", vec!["".into()]), Ok(Value::Bool(true)));
}

#[test]
fn test_text_positions() {
    assert_eq!(call("string-starts-at", vec!["héllo".into(), "llo".into()]), Ok(Value::Number(3.0)));
    assert_eq!(call("string-starts-at", vec!["hello".into(), "z".into()]), Ok(Value::Number(0.0)));
    assert_eq!(
        call("string-substring", vec!["hello".into(), 2.into(), 3.into()]),
        Ok(Value::from("ell"))
    );
    assert!(call("string-substring", vec!["hello".into(), 4.into(), 5.into()]).is_err());
    assert_eq!(
        call("string-substring", vec!["hello".into(), 6.into(), 0.into()]),
        Ok(Value::from(""))
    );
    assert_eq!(
        call("string-replace-all", vec!["a-b-c".into(), "-".into(), "+".into()]),
        Ok(Value::from("a+b+c"))
    );
}

#[test]
fn test_substring_huge_bounds() {
    let huge = Value::Number(9e18);
    let err = call("string-substring", vec!["abc".into(), huge.clone(), huge.clone()]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
    assert!(call("string-substring", vec!["abc".into(), 1.into(), huge]).is_err());
}

#[test]
fn test_text_coercions() {
    assert_eq!(call("coerce-to-number", vec![" 12 ".into()]), Ok(Value::Number(12.0)));
    assert_eq!(call("coerce-to-number", vec!["twelve".into()]), Ok(Value::NonCoercible));
    assert_eq!(call("coerce-to-string", vec![98_765_432.1.into()]), Ok(Value::from("9.8765E7")));
    assert_eq!(call("is-number?", vec!["3".into()]), Ok(Value::Bool(true)));
    assert_eq!(call("is-string?", vec![3.into()]), Ok(Value::Bool(false)));
}

#[test]
fn test_empty_text_argument_marker() {
    let err = call("string-append", vec![Value::nothing(), Value::NonCoercible]).unwrap_err();
    assert_eq!(
        err.reason,
        "The operation string-append cannot accept the arguments: , [*empty-string*], [non-coercible]"
    );
}

// =============================================================================
// list
// =============================================================================

#[test]
fn test_lists() {
    let list = call("make-yail-list", vec!["a".into(), 2.into(), "c".into()]).unwrap();
    assert_eq!(call("yail-list-length", vec![list.clone()]), Ok(Value::Number(3.0)));
    assert_eq!(call("yail-list-get-item", vec![list.clone(), 2.into()]), Ok(Value::Number(2.0)));
    assert_eq!(call("yail-list-member?", vec!["2".into(), list.clone()]), Ok(Value::Bool(true)));
    assert_eq!(call("yail-list-index", vec!["c".into(), list.clone()]), Ok(Value::Number(3.0)));
    assert_eq!(
        call("yail-list-join-with-separator", vec![list.clone(), ", ".into()]),
        Ok(Value::from("a, 2, c"))
    );
    assert_eq!(
        display(&call("yail-list-reverse", vec![list.clone()]).unwrap()),
        r#"["c", 2, "a"]"#
    );
}

#[test]
fn test_list_index_out_of_range() {
    let list = Value::List(vec![1.into()]);
    let err = call("yail-list-get-item", vec![list, 2.into()]).unwrap_err();
    assert_eq!(
        err.reason,
        "Select list item: Attempt to get item number 2 of a list of length 1"
    );
}

#[test]
fn test_list_append_returns_new_list() {
    let a = Value::List(vec![1.into()]);
    let b = Value::List(vec![2.into()]);
    assert_eq!(
        call("yail-list-append", vec![a.clone(), b]),
        Ok(Value::List(vec![1.into(), 2.into()]))
    );
    assert_eq!(a, Value::List(vec![1.into()]));
}

// =============================================================================
// dictionary
// =============================================================================

#[test]
fn test_dictionaries() {
    let pair_a = call("make-dictionary-pair", vec!["a".into(), 1.into()]).unwrap();
    let pair_b = call("make-dictionary-pair", vec![2.into(), "two".into()]).unwrap();
    let dict = call("make-yail-dictionary", vec![pair_a, pair_b]).unwrap();

    assert_eq!(display(&dict), r#"{"a": 1, "2": "two"}"#);
    assert_eq!(
        call("yail-dictionary-lookup", vec![2.into(), dict.clone(), "none".into()]),
        Ok(Value::from("two"))
    );
    assert_eq!(
        call("yail-dictionary-lookup", vec!["z".into(), dict.clone(), "none".into()]),
        Ok(Value::from("none"))
    );

    let updated = call("yail-dictionary-set-pair", vec!["c".into(), dict.clone(), true.into()]).unwrap();
    assert_eq!(call("yail-dictionary-length", vec![updated.clone()]), Ok(Value::Number(3.0)));

    let removed = call("yail-dictionary-delete-pair", vec![updated, "a".into()]).unwrap();
    assert_eq!(
        display(&call("yail-dictionary-get-keys", vec![removed]).unwrap()),
        r#"["2", "c"]"#
    );
}

#[test]
fn test_empty_dictionary_displays_braces() {
    let dict = call("make-yail-dictionary", vec![]).unwrap();
    assert_eq!(display(&dict), "{}");
    assert_eq!(call("yail-dictionary?", vec![dict]), Ok(Value::Bool(true)));
}

// =============================================================================
// time
// =============================================================================

#[test]
fn test_instants() {
    let start = call("yail-parse-instant", vec!["2024-05-01T10:00:00Z".into()]).unwrap();
    let later = call("yail-instant-add-seconds", vec![start.clone(), 90.into()]).unwrap();
    assert_eq!(
        call("yail-format-instant", vec![later.clone()]),
        Ok(Value::from("2024-05-01T10:01:30Z"))
    );
    assert_eq!(
        call("yail-instant-seconds-between", vec![start, later]),
        Ok(Value::Number(90.0))
    );
    assert!(call("yail-parse-instant", vec!["May 1st".into()]).is_err());
}

#[test]
fn test_instants_in_zone() {
    let coercer = Coercer::new(Tz::America__New_York);
    let instant = Value::Instant(Utc.with_ymd_and_hms(2024, 7, 4, 16, 0, 0).unwrap());
    let formatted = call_primitive("yail-format-instant", &[instant], &coercer).unwrap();
    assert_eq!(formatted, Some(Value::from("2024-07-04T12:00:00Z")));
}
