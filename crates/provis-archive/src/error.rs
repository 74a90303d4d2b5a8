use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("zip-slip attack detected: entry '{entry}' resolves outside '{base}'")]
    ZipSlip { entry: PathBuf, base: PathBuf },

    #[error("entry path contains null byte")]
    InvalidPath,

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("archive is corrupted: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
