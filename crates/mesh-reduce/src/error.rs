//! Error types for the reduction pipeline with rich diagnostics.
//!
//! Document-level problems are fatal and abort the run with no partial
//! output; everything below the document level (degenerate polylines,
//! early-stopped decimation) is recovered locally and surfaced through
//! telemetry instead of an error.
//!
//! # Error Codes
//!
//! Each error has a unique code in the format `REDUCE-XXXX`:
//! - `REDUCE-1xxx`: input errors (file reading, parsing)
//! - `REDUCE-2xxx`: geometry validation errors

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type ReduceResult<T> = Result<T, ReduceError>;

/// Machine-readable error codes for pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// REDUCE-1001: Failed to read the input document
    IoRead = 1001,
    /// REDUCE-1002: Failed to parse the input document
    ParseError = 1002,
    /// REDUCE-2001: Document is well-formed but carries no usable geometry
    EmptyInput = 2001,
    /// REDUCE-2002: A polyline point has a NaN or infinite coordinate
    InvalidCoordinate = 2002,
}

impl ErrorCode {
    /// Returns the error code as a string in the format `REDUCE-XXXX`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::IoRead => "REDUCE-1001",
            ErrorCode::ParseError => "REDUCE-1002",
            ErrorCode::EmptyInput => "REDUCE-2001",
            ErrorCode::InvalidCoordinate => "REDUCE-2002",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recovery suggestions for pipeline errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverySuggestion {
    /// Re-export the polyline document from the extraction tool.
    ReexportDocument,
    /// Check the input document for the listed problems.
    CheckDocument { checks: Vec<String> },
    /// No automatic recovery available.
    None,
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoverySuggestion::ReexportDocument => {
                write!(f, "Re-export the polyline document from the extraction tool")
            }
            RecoverySuggestion::CheckDocument { checks } => {
                write!(f, "Check the input document for: {}", checks.join(", "))
            }
            RecoverySuggestion::None => write!(f, "No automatic recovery available"),
        }
    }
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error, Diagnostic)]
pub enum ReduceError {
    /// Error reading the input document.
    #[error("failed to read polyline document from {path}")]
    #[diagnostic(
        code(reduce::io::read),
        help("Check that the file exists and is readable")
    )]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing the input document.
    #[error("failed to parse polyline document from {path}: {details}")]
    #[diagnostic(
        code(reduce::parse::error),
        help(
            "The document must be a JSON object with a `polylines` array; each entry needs a `points` array of [x, y, z] triples."
        )
    )]
    ParseError { path: PathBuf, details: String },

    /// Well-formed document with no usable geometry.
    #[error("input contains no usable geometry: {details}")]
    #[diagnostic(
        code(reduce::input::empty),
        help(
            "The run is aborted before any processing stage. Check that the extraction step produced polylines."
        )
    )]
    EmptyInput { details: String },

    /// Non-finite coordinate in the input.
    #[error(
        "invalid coordinate in polyline {polyline_index}, point {point_index}: {coordinate} is {value}"
    )]
    #[diagnostic(
        code(reduce::input::coordinate),
        help("Check the extraction step for numerical issues in the source drawing.")
    )]
    InvalidCoordinate {
        polyline_index: usize,
        point_index: usize,
        coordinate: &'static str,
        value: f64,
    },
}

impl ReduceError {
    /// Returns the machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ReduceError::IoRead { .. } => ErrorCode::IoRead,
            ReduceError::ParseError { .. } => ErrorCode::ParseError,
            ReduceError::EmptyInput { .. } => ErrorCode::EmptyInput,
            ReduceError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
        }
    }

    /// Returns a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self {
            ReduceError::IoRead { .. } => RecoverySuggestion::CheckDocument {
                checks: vec!["file exists".into(), "file permissions".into()],
            },
            ReduceError::ParseError { .. } => RecoverySuggestion::ReexportDocument,
            ReduceError::EmptyInput { .. } => RecoverySuggestion::CheckDocument {
                checks: vec![
                    "polylines array is present".into(),
                    "entries carry at least two points".into(),
                ],
            },
            ReduceError::InvalidCoordinate { .. } => RecoverySuggestion::ReexportDocument,
        }
    }

    // Constructor helpers for common error patterns

    /// Create an `IoRead` error.
    pub fn io_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReduceError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a `ParseError`.
    pub fn parse_error(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        ReduceError::ParseError {
            path: path.into(),
            details: details.into(),
        }
    }

    /// Create an `EmptyInput` error.
    pub fn empty_input(details: impl Into<String>) -> Self {
        ReduceError::EmptyInput {
            details: details.into(),
        }
    }

    /// Create an `InvalidCoordinate` error.
    pub fn invalid_coordinate(
        polyline_index: usize,
        point_index: usize,
        coordinate: &'static str,
        value: f64,
    ) -> Self {
        ReduceError::InvalidCoordinate {
            polyline_index,
            point_index,
            coordinate,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ReduceError::empty_input("no polylines");
        assert_eq!(err.code(), ErrorCode::EmptyInput);
        assert_eq!(err.code().as_str(), "REDUCE-2001");
    }

    #[test]
    fn test_error_display() {
        let err = ReduceError::invalid_coordinate(3, 7, "y", f64::NAN);
        let display = format!("{}", err);
        assert!(display.contains("polyline 3"));
        assert!(display.contains("point 7"));
        assert!(display.contains("y"));
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = ReduceError::empty_input("zero polylines after filtering");
        match err.recovery_suggestion() {
            RecoverySuggestion::CheckDocument { checks } => assert!(!checks.is_empty()),
            other => panic!("expected CheckDocument, got {:?}", other),
        }
    }
}
