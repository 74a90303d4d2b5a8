//! Pure transformations for HTTP fetching.

mod retry;
mod validation;

pub use retry::retry_delay;
pub use validation::{is_retryable_status, is_success};
