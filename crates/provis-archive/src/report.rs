use std::path::PathBuf;

#[derive(Clone, Debug, Default)]
pub struct ExtractReport {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries: Vec<ExtractedEntry>,
    /// Entries dropped because they would have escaped the destination.
    pub rejected: Vec<PathBuf>,
    /// Entries skipped by prefix or because they were directories.
    pub skipped: usize,
}

#[derive(Clone, Debug)]
pub struct ExtractedEntry {
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub size: u64,
}
