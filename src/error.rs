//! Error types for the lockbox parser.
//!
//! Every failure carries an [`ErrorKind`] describing what went wrong, and the
//! parse driver attaches a [`LineContext`] (1-based line number plus the raw
//! line text) exactly once at the top of the call stack. Kind-based matching
//! therefore survives the annotation: callers can still distinguish a
//! parse-time failure from a consistency failure programmatically.

use crate::schema::FieldClass;
use std::fmt;
use thiserror::Error;

/// Result type alias for parser operations
pub type Result<T> = std::result::Result<T, LockboxError>;

/// The specific failure observed at the point of detection.
#[derive(Error, Debug)]
pub enum ErrorKind {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error while writing the check projection
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: bai-lockbox <input.bai>")]
    MissingArgument,

    /// A line exceeded the maximum record length
    #[error("record longer than {limit}")]
    RecordTooLong { limit: usize },

    /// A field's raw bytes do not match its declared class
    #[error("field {field} does not match expected type {expected}")]
    FieldType {
        field: &'static str,
        expected: FieldClass,
    },

    /// A field passed its class check but could not be converted
    #[error("field {field} has malformed value \"{raw}\"")]
    FieldFormat { field: &'static str, raw: String },

    /// A date field failed calendar validation
    #[error("{raw} is not a valid {layout}-formatted date")]
    DateFormat { raw: String, layout: &'static str },

    /// A time field failed calendar validation
    #[error("{raw} is not a valid HHMM-formatted time")]
    TimeFormat { raw: String },

    /// The leading digit of a line matched no known record variant
    #[error("unknown record type {tag}")]
    UnknownRecordType { tag: char },

    /// A record appeared in an illegal position in the file grammar
    #[error("{0}")]
    Structure(String),

    /// A structurally valid document whose declared totals do not match
    /// the recomputed totals
    #[error("{0}")]
    Consistency(String),
}

/// Coarse grouping of [`ErrorKind`] variants, mirroring the three failure
/// families of the format: definition defects, parse/structure failures, and
/// reconciliation failures. CLI plumbing errors group under [`ErrorClass::Io`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Definition,
    Parse,
    Consistency,
    Io,
}

impl ErrorKind {
    /// Returns the coarse class of this kind.
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::DateFormat { .. } | ErrorKind::TimeFormat { .. } => ErrorClass::Definition,
            ErrorKind::RecordTooLong { .. }
            | ErrorKind::FieldType { .. }
            | ErrorKind::FieldFormat { .. }
            | ErrorKind::UnknownRecordType { .. }
            | ErrorKind::Structure(_) => ErrorClass::Parse,
            ErrorKind::Consistency(_) => ErrorClass::Consistency,
            ErrorKind::Io(_) | ErrorKind::Csv(_) | ErrorKind::MissingArgument => ErrorClass::Io,
        }
    }
}

/// Where in the input a failure was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineContext {
    /// 1-based line number
    pub line_number: usize,

    /// The raw line text as received (after surrounding-whitespace trim)
    pub raw_line: String,
}

/// A lockbox failure: the original [`ErrorKind`] plus, once the parse driver
/// has seen it, the line it was raised on.
#[derive(Debug)]
pub struct LockboxError {
    /// The original failure, preserved through annotation
    pub kind: ErrorKind,

    /// Attached once by the parse loop; `None` for failures raised outside
    /// the per-line path (I/O, CLI usage)
    pub context: Option<LineContext>,
}

impl LockboxError {
    /// Wraps a kind with no line context yet.
    pub fn new(kind: ErrorKind) -> Self {
        LockboxError {
            kind,
            context: None,
        }
    }

    /// Attaches line context. The first annotation wins; re-wrapping at an
    /// outer layer never clobbers the original location.
    pub fn with_context(mut self, line_number: usize, raw_line: &str) -> Self {
        if self.context.is_none() {
            self.context = Some(LineContext {
                line_number,
                raw_line: raw_line.to_string(),
            });
        }
        self
    }
}

impl fmt::Display for LockboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(
                f,
                "Line {}: {} (\"{}\")",
                ctx.line_number, self.kind, ctx.raw_line
            ),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for LockboxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for LockboxError {
    fn from(kind: ErrorKind) -> Self {
        LockboxError::new(kind)
    }
}

impl From<std::io::Error> for LockboxError {
    fn from(err: std::io::Error) -> Self {
        LockboxError::new(ErrorKind::Io(err))
    }
}

impl From<csv::Error> for LockboxError {
    fn from(err: csv::Error) -> Self {
        LockboxError::new(ErrorKind::Csv(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_attached_once() {
        let err = LockboxError::new(ErrorKind::Structure("expected service record".into()))
            .with_context(3, "50000000022222160523AB")
            .with_context(9, "some outer line");

        let ctx = err.context.unwrap();
        assert_eq!(ctx.line_number, 3);
        assert_eq!(ctx.raw_line, "50000000022222160523AB");
    }

    #[test]
    fn test_kind_survives_annotation() {
        let err = LockboxError::new(ErrorKind::UnknownRecordType { tag: '3' })
            .with_context(1, "3XYZ");

        assert!(matches!(err.kind, ErrorKind::UnknownRecordType { tag: '3' }));
        assert_eq!(err.kind.class(), ErrorClass::Parse);
    }

    #[test]
    fn test_display_with_context() {
        let err = LockboxError::new(ErrorKind::UnknownRecordType { tag: '3' })
            .with_context(4, "3ABC");

        assert_eq!(err.to_string(), "Line 4: unknown record type 3 (\"3ABC\")");
    }

    #[test]
    fn test_error_classes() {
        let date = ErrorKind::DateFormat {
            raw: "169999".into(),
            layout: "YYMMDD",
        };
        assert_eq!(date.class(), ErrorClass::Definition);

        let cons = ErrorKind::Consistency("totals differ".into());
        assert_eq!(cons.class(), ErrorClass::Consistency);
    }
}
