//! Error types for tcx-eval

use std::path::PathBuf;
use thiserror::Error;

/// Dataset loading failure
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset file could not be read
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line is not a valid test case (1-based line number)
    #[error("Malformed test case on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Two records share an id
    #[error("Duplicate test case id '{id}' on line {line}")]
    DuplicateId { id: String, line: usize },

    /// No test cases found
    #[error("Dataset contains no test cases")]
    Empty,
}

/// Report or artifact I/O failure
#[derive(Debug, Error)]
pub enum ReportError {
    /// Filesystem operation failed
    #[error("Report I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("Report JSON error for {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_error_names_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DatasetError::Malformed { line: 7, source };
        assert!(err.to_string().contains("line 7"));
    }
}
