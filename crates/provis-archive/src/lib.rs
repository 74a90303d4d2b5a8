//! Archive extraction with path sanitization.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Entry path normalization, flattening and zip-slip prevention
//! - `extract.rs` - Streaming zip extraction
//! - `options.rs` / `report.rs` - Shared types

pub use error::{Error, Result};
pub use extract::{extract_zip, extract_zip_file};
pub use options::{EscapePolicy, ExtractOptions};
pub use report::{ExtractReport, ExtractedEntry};
pub use sanitize::{SanitizedPath, sanitize_path};

mod error;
mod extract;
mod options;
mod report;
mod sanitize;
