use crate::data::options::FetchPhase;

/// Current state of a single download, handed to progress callbacks.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: FetchPhase,

    /// Bytes written to the staging file so far.
    pub bytes_downloaded: u64,

    /// From Content-Length or the descriptor, when known.
    pub total_bytes: Option<u64>,

    /// 0 on the first attempt.
    pub retry_count: u32,
}

impl Progress {
    /// Percentage of completion, `None` if the total is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                if self.is_completed() { 100.0 } else { 0.0 }
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.phase == FetchPhase::Completed
    }
}
