//! Error types for the data-loader crate.
//!
//! Every failure while reading the MovieLens files ends up in one of these
//! variants. The caller decides whether a variant is fatal; inside this
//! crate nothing is retried.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during data loading and parsing
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    ///
    /// `line` is 1-based, matching what an editor shows.
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// Data validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DataLoadError {
    /// Map an `io::Error` raised while opening `path`.
    ///
    /// `NotFound` becomes [`DataLoadError::FileNotFound`] so callers can tell
    /// a missing dataset apart from a read failure.
    pub(crate) fn from_open(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            DataLoadError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            DataLoadError::IoError(err)
        }
    }

    /// True when the error means the input file is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataLoadError::FileNotFound { .. })
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
