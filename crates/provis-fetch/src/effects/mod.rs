//! I/O operations for HTTP fetching.

mod batch;
mod fetcher;
mod http;
mod memory;

pub use fetcher::Fetcher;
pub use http::{BoxStream, HttpClient, HttpResponse};
pub use memory::{MemoryClient, MemoryError};

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
