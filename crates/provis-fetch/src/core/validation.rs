/// Returns `true` for 2xx responses; everything else is a failed fetch.
///
/// ```
/// use provis_fetch::is_success;
///
/// assert!(is_success(200));
/// assert!(!is_success(304));
/// assert!(!is_success(404));
/// ```
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Server-side and throttling failures may succeed on a later attempt.
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 429 || status == 408
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(199));
        assert!(!is_success(301));
        assert!(!is_success(500));
    }

    #[test]
    fn test_client_errors_are_not_retried() {
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(403));
        assert!(!is_retryable_status(404));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(503));
    }
}
