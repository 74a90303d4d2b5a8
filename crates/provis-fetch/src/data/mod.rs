//! Immutable data types for HTTP fetching operations.

pub mod batch;
pub mod options;
pub mod progress;

pub use batch::{BatchOptions, DownloadJob, JobOutcome};
pub use options::{FetchOptions, FetchPhase};
pub use progress::Progress;
