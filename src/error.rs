//! Error types for issue decoding and loading.
//!
//! Validation failures are not errors of this crate: they are returned as
//! [`ValidationError`](crate::ValidationError) values. The types here signal
//! misuse or malformed input.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed issue record or issue vocabulary value.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("unknown issue code \"{code}\"")]
    UnknownCode { code: String },

    #[error(
        "invalid path segment {segment}: expected string or integer in 0..={max}",
        max = crate::types::MAX_PATH_INDEX
    )]
    InvalidPathSegment { segment: String },

    #[error("invalid issue record at {path}: {message}")]
    InvalidRecord { path: String, message: String },

    #[error("invalid property \"{key}\" at {path}: {message}")]
    InvalidProperty {
        path: String,
        key: String,
        message: String,
    },
}

/// Errors while loading issue documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Issue(#[from] IssueError),
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}
