//! Error types for provis-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("size mismatch for {url}: expected {expected} bytes, got {actual}")]
    SizeMismatch { url: String, expected: u64, actual: u64 },

    #[error("file I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("download cancelled")]
    Cancelled,
}

impl Error {
    /// Network-layer failure: the remote could not be reached or refused the request.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Status { .. } | Error::Transport { .. })
    }

    /// Transport errors and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { .. } => true,
            Error::Status { status, .. } => crate::core::is_retryable_status(*status),
            _ => false,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { path, source }
    }

    pub(crate) fn transport(url: &str, cause: impl std::fmt::Display) -> Error {
        Error::Transport {
            url: url.to_string(),
            message: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
