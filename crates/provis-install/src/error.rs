use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline errors. Best-effort failures never surface here; they
/// are logged and counted in the [`InstallReport`](crate::InstallReport).
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unreachable: {0}")]
    Unreachable(#[source] provis_fetch::Error),

    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    #[error("malformed {what}: {message}")]
    Malformed { what: String, message: String },

    #[error("path '{path}' escapes '{root}'")]
    PathViolation { path: PathBuf, root: PathBuf },

    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("an installation is already in progress")]
    AlreadyInProgress,

    #[error("installation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    pub(crate) fn malformed(what: impl Into<String>, message: impl ToString) -> Self {
        InstallError::Malformed {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> InstallError {
        let path = path.into();
        move |source| InstallError::Io { path, source }
    }
}

impl From<provis_fetch::Error> for InstallError {
    fn from(e: provis_fetch::Error) -> Self {
        use provis_fetch::Error as Fetch;
        match e {
            Fetch::Cancelled => InstallError::Cancelled,
            Fetch::Io { path, source } => InstallError::Io { path, source },
            e @ (Fetch::ChecksumMismatch { .. } | Fetch::SizeMismatch { .. }) => {
                InstallError::malformed("download", e)
            }
            e => InstallError::Unreachable(e),
        }
    }
}

impl From<provis_fs::Error> for InstallError {
    fn from(e: provis_fs::Error) -> Self {
        match e {
            provis_fs::Error::Io { path, source } => InstallError::Io { path, source },
            provis_fs::Error::OutsideRoot { path, root } => InstallError::PathViolation { path, root },
        }
    }
}

impl From<provis_manifest::Error> for InstallError {
    fn from(e: provis_manifest::Error) -> Self {
        match e {
            provis_manifest::Error::Path(e) => e.into(),
            provis_manifest::Error::Json { what, source } => InstallError::malformed(what, source),
            e => InstallError::malformed("descriptor", e),
        }
    }
}
