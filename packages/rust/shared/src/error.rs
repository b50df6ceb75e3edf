//! Error types for Folio.
//!
//! Library crates use [`FolioError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Folio operations.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// Configuration loading or validation error (including unknown grouping schemas).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a document.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Text-transform service failure (LLM API, response shape, local conversion).
    #[error("transform error: {0}")]
    Transform(String),

    /// A persisted blob could not be read (missing or unreadable).
    #[error("read error for {key}: {message}")]
    Read { key: String, message: String },

    /// A blob could not be persisted.
    #[error("write error for {key}: {message}")]
    Write { key: String, message: String },

    /// Database layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed manifest, invalid URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a read error for the blob stored under `key`.
    pub fn read(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Read {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Create a write error for the blob stored under `key`.
    pub fn write(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Write {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
