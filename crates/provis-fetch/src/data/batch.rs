use std::path::PathBuf;

use provis_verify::ExpectedDigest;

use crate::Error;

/// Configuration for batch downloads.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Downloads in flight at once.
    pub max_concurrent: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { max_concurrent: 8 }
    }
}

impl BatchOptions {
    #[must_use]
    pub fn max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }
}

/// One file in a batch download.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Caller-chosen identifier, echoed back in the outcome.
    pub id: String,
    pub url: String,
    pub destination: PathBuf,
    pub size: Option<u64>,
    pub sha1: Option<ExpectedDigest>,
}

impl DownloadJob {
    pub fn new(id: impl Into<String>, url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            destination: destination.into(),
            size: None,
            sha1: None,
        }
    }

    #[must_use]
    pub fn size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    #[must_use]
    pub fn sha1(mut self, sha1: Option<ExpectedDigest>) -> Self {
        self.sha1 = sha1;
        self
    }
}

/// Result of one batch job. A failed job never affects its siblings.
#[derive(Debug)]
pub struct JobOutcome {
    pub id: String,
    pub destination: PathBuf,
    /// Bytes written on success.
    pub result: Result<u64, Error>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
