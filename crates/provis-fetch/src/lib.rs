//! HTTP downloading with streaming verification and atomic placement.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and progress types
//! - `core` - Pure decisions (status classification, retry delay)
//! - `effects` - I/O operations behind the [`HttpClient`] abstraction
//!
//! # Key Features
//!
//! - **Single-Pass**: payloads are SHA-1 hashed while they stream to disk
//! - **Atomic Placement**: bytes land in a sibling `.part` file and are renamed
//!   into place only after size and checksum verification
//! - **Bounded Batches**: [`Fetcher::fetch_all`] runs downloads concurrently up to
//!   a limit and reports completions from a single polling point

mod core;
pub mod data;
mod effects;
mod error;

pub use core::{is_retryable_status, is_success, retry_delay};
pub use data::{BatchOptions, DownloadJob, FetchOptions, FetchPhase, JobOutcome, Progress};
pub use effects::{BoxStream, Fetcher, HttpClient, HttpResponse, MemoryClient, MemoryError};
pub use error::{Error, Result};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use tokio_util::sync::CancellationToken;
