//! Error types for ingestion, mapping, and cell editing.

use thiserror::Error;

/// Failures surfaced by the reconciliation pipeline.
///
/// Every variant is recoverable by the end user: re-upload a file or pick a
/// different mapping. None are retried automatically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// The uploaded file is not a CSV file.
    #[error("invalid file type: '{name}' is not a CSV file")]
    InvalidFileType { name: String },

    /// The file content is not well-formed delimited text.
    #[error("{}", format_parse_error(*line, message))]
    Parse { line: Option<u64>, message: String },

    /// A request referenced a field, column, or row that does not exist.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ReconcileError {
    pub fn parse(line: Option<u64>, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

fn format_parse_error(line: Option<u64>, message: &str) -> String {
    match line {
        Some(line) => format!("failed to parse CSV at line {line}: {message}"),
        None => format!("failed to parse CSV: {message}"),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("row index {index} is out of range ({len} row(s) available)")]
    RowOutOfRange { index: usize, len: usize },

    #[error("file '{name}' is {size} byte(s), limit is {limit}")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("invalid field profile: {reason}")]
    InvalidProfile { reason: String },
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_mentions_line_when_known() {
        let err = ReconcileError::parse(Some(3), "unterminated quoted field");
        assert_eq!(
            err.to_string(),
            "failed to parse CSV at line 3: unterminated quoted field"
        );
        let err = ReconcileError::parse(None, "input is empty");
        assert_eq!(err.to_string(), "failed to parse CSV: input is empty");
    }

    #[test]
    fn validation_errors_convert_transparently() {
        let err: ReconcileError = ValidationError::UnknownField {
            field: "Memo".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "unknown field 'Memo'");
        assert!(matches!(err, ReconcileError::Validation(_)));
    }
}
