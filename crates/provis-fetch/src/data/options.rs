use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use provis_verify::ExpectedDigest;

use super::progress::Progress;

/// Phases of a download operation.
///
/// Connecting → Downloading → Verifying → Committing → Completed.
/// Retries return to the Connecting phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Connecting,
    Downloading,
    Verifying,
    Committing,
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Verifying => write!(f, "Verifying"),
            FetchPhase::Committing => write!(f, "Committing"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Configuration for a single fetch.
///
/// ```
/// use provis_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .max_retries(5)
///     .retry_backoff(Duration::from_millis(200))
///     .expected_size(Some(1024));
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Expected SHA-1 of the payload. A mismatch fails the fetch and the
    /// partial file is discarded.
    pub sha1: Option<ExpectedDigest>,

    /// Expected payload length in bytes.
    pub expected_size: Option<u64>,

    /// Retries after the initial attempt, for transport errors and
    /// retryable statuses only. Total attempts = 1 + max_retries.
    ///
    /// Default: 3
    pub max_retries: u32,

    /// Base delay; retry N waits `retry_backoff * 2^N`.
    ///
    /// Default: 100ms
    pub retry_backoff: Duration,

    /// Extra request headers sent with every attempt.
    pub headers: Arc<[(String, String)]>,

    /// Invoked on phase transitions and after every chunk write.
    pub on_progress: Option<Arc<dyn Fn(&Progress) + Send + Sync>>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("sha1", &self.sha1)
            .field("expected_size", &self.expected_size)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("headers", &self.headers)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            sha1: None,
            expected_size: None,
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            headers: Arc::new([]),
            on_progress: None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn sha1(mut self, sha1: Option<ExpectedDigest>) -> Self {
        self.sha1 = sha1;
        self
    }

    #[must_use]
    pub fn expected_size(mut self, size: Option<u64>) -> Self {
        self.expected_size = size;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, on_progress: Arc<dyn Fn(&Progress) + Send + Sync>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }
}
