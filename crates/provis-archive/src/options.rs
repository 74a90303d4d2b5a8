/// What to do with an entry whose normalized path leaves the destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EscapePolicy {
    /// Abort extraction with [`Error::ZipSlip`](crate::Error::ZipSlip).
    #[default]
    Reject,
    /// Drop the entry, record it in the report and keep going.
    Skip,
}

#[derive(Clone, Debug, Default)]
pub struct ExtractOptions {
    /// Write every file directly under the destination, dropping the
    /// entry's directories. Containment is still checked on the full path.
    pub flatten: bool,
    /// Entries whose path starts with any of these prefixes are not extracted.
    pub exclude_prefixes: Vec<String>,
    pub on_escape: EscapePolicy,
    /// Skip directory entries instead of creating them.
    pub files_only: bool,
}

impl ExtractOptions {
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    pub fn on_escape(mut self, policy: EscapePolicy) -> Self {
        self.on_escape = policy;
        self
    }

    pub fn files_only(mut self, files_only: bool) -> Self {
        self.files_only = files_only;
        self
    }

    pub(crate) fn is_excluded(&self, entry_name: &str) -> bool {
        self.exclude_prefixes
            .iter()
            .any(|prefix| entry_name.starts_with(prefix.as_str()))
    }
}
