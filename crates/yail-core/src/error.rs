//! Structured errors crossing the bridge, and the reporter that builds them.

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::coerce::Coercer;
use crate::value::Value;

/// Category of a bridge failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    RuntimeTypeError,
    DispatchFailure,
    ChannelFailure,
    SyntaxError,
    UnboundVariable,
    UnknownComponent,
    UnknownProperty,
    UnknownMethod,
    UnknownEvent,
    UnknownProcedure,
    ArityMismatch,
    RecursionLimit,
    RuntimeError,
}

/// The one error type that crosses the interpreter/native boundary.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{reason}")]
pub struct StructuredError {
    pub kind: ErrorKind,
    pub reason: String,
    pub procedure_name: Option<String>,
    /// Display strings of the offending arguments, when there were any.
    #[serde(skip)]
    pub arguments: Vec<String>,
}

impl StructuredError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
            procedure_name: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_procedure(mut self, name: impl Into<String>) -> Self {
        self.procedure_name = Some(name.into());
        self
    }

    pub fn runtime(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, reason)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.reason.clone())
    }
}

/// Placeholder shown for an empty text argument.
const EMPTY_STRING_MARKER: &str = "*empty-string*";

/// Build the error raised when a procedure receives arguments it cannot use.
///
/// ```
/// use yail_core::{Coercer, Value, generate_runtime_type_error};
///
/// let err = generate_runtime_type_error(&Coercer::default(), "+", &[Value::from("a"), Value::from(1)]);
/// assert_eq!(err.reason, "The operation + cannot accept the arguments: , [a], [1]");
/// ```
pub fn generate_runtime_type_error(
    coercer: &Coercer,
    procedure_name: &str,
    args: &[Value],
) -> StructuredError {
    let arguments: Vec<String> = args
        .iter()
        .map(|arg| match coercer.display(arg) {
            text if text.is_empty() => EMPTY_STRING_MARKER.to_string(),
            text => text,
        })
        .collect();

    let rendered = if arguments.is_empty() {
        " (none)".to_string()
    } else {
        arguments.iter().map(|a| format!(", [{}]", a)).collect()
    };

    StructuredError {
        kind: ErrorKind::RuntimeTypeError,
        reason: format!(
            "The operation {} cannot accept the arguments:{}",
            procedure_name, rendered
        ),
        procedure_name: Some(procedure_name.to_string()),
        arguments,
    }
}

/// Builds structured errors and keeps those that surfaced outside any block.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    coercer: Coercer,
    reported: Vec<StructuredError>,
}

impl ErrorReporter {
    pub fn new(coercer: Coercer) -> Self {
        Self {
            coercer,
            reported: Vec::new(),
        }
    }

    pub fn generate_runtime_type_error(&self, procedure_name: &str, args: &[Value]) -> StructuredError {
        generate_runtime_type_error(&self.coercer, procedure_name, args)
    }

    /// Log and record an error that has no block to return to.
    pub fn report(&mut self, err: StructuredError) {
        error!(kind = ?err.kind, procedure = ?err.procedure_name, "{}", err.reason);
        self.reported.push(err);
    }

    pub fn reported(&self) -> &[StructuredError] {
        &self.reported
    }

    pub fn take_reported(&mut self) -> Vec<StructuredError> {
        std::mem::take(&mut self.reported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_names_procedure() {
        let err = generate_runtime_type_error(
            &Coercer::default(),
            "string-length",
            &[Value::from(3), Value::List(vec![])],
        );
        assert_eq!(err.kind, ErrorKind::RuntimeTypeError);
        assert_eq!(
            err.reason,
            "The operation string-length cannot accept the arguments: , [3], [[]]"
        );
        assert_eq!(err.procedure_name.as_deref(), Some("string-length"));
        assert!(!err.reason.contains("{}"));
    }

    #[test]
    fn test_empty_text_marker() {
        let err = generate_runtime_type_error(&Coercer::default(), "foo", &[Value::nothing()]);
        assert_eq!(err.arguments, vec!["*empty-string*"]);
        assert!(err.reason.ends_with(", [*empty-string*]"));
    }

    #[test]
    fn test_no_arguments() {
        let err = generate_runtime_type_error(&Coercer::default(), "bar", &[]);
        assert_eq!(err.reason, "The operation bar cannot accept the arguments: (none)");
    }

    #[test]
    fn test_json_shape() {
        let err = StructuredError::new(ErrorKind::DispatchFailure, "boom").with_procedure("Click");
        assert_eq!(
            err.to_json(),
            r#"{"kind":"DispatchFailure","reason":"boom","procedureName":"Click"}"#
        );
    }

    #[test]
    fn test_reporter_keeps_reports() {
        let mut reporter = ErrorReporter::default();
        reporter.report(StructuredError::runtime("first"));
        reporter.report(StructuredError::runtime("second"));
        assert_eq!(reporter.reported().len(), 2);
        let taken = reporter.take_reported();
        assert_eq!(taken[0].reason, "first");
        assert!(reporter.reported().is_empty());
    }
}
