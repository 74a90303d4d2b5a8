use std::path::Path;

use provis_fetch::{BatchOptions, CancellationToken, FetchOptions, Fetcher, HttpClient};
use provis_manifest::{Platform, Repositories};
use provis_verify::ExpectedDigest;

use crate::{InstallError, InstallerConfig, Layout, Result};

/// Everything a stage needs: network access, where to write, and for
/// which platform.
pub struct Context<C: HttpClient> {
    pub(crate) fetcher: Fetcher<C>,
    pub(crate) config: InstallerConfig,
    pub(crate) layout: Layout,
    pub(crate) platform: Platform,
    pub(crate) repos: Repositories,
}

impl<C: HttpClient> Context<C> {
    /// Build a context for `root`. The platform comes from the config
    /// override when set, the running host otherwise.
    pub fn new(client: C, config: InstallerConfig, root: impl AsRef<Path>) -> Self {
        let platform = config.platform();
        let repos = Repositories::new(config.libraries_url.clone(), config.loader_maven_url.clone());
        Self {
            fetcher: Fetcher::new(client),
            layout: Layout::new(root.as_ref()),
            config,
            platform,
            repos,
        }
    }

    /// Configuration this context was built from.
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Paths under the installation root.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Platform used for rule evaluation and native classifiers.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Bases for coordinate-derived library URLs.
    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Fetcher over the injected HTTP client.
    pub fn fetcher(&self) -> &Fetcher<C> {
        &self.fetcher
    }

    /// Per-request options: retry budget from the config.
    pub(crate) fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default().max_retries(self.config.max_retries)
    }

    pub(crate) fn batch_options(&self) -> BatchOptions {
        BatchOptions::default().max_concurrent(self.config.max_concurrent_downloads)
    }

    /// Presence predicate for an existing file. Hashes are only consulted
    /// when `verify_hashes` is enabled.
    pub(crate) fn is_present(&self, path: &Path, size: Option<u64>, sha1: Option<&str>) -> Result<bool> {
        let expected = if self.config.verify_hashes {
            sha1.and_then(|hex| ExpectedDigest::from_hex(hex).ok())
        } else {
            None
        };
        Ok(provis_fs::check_file(path, size, expected.as_ref())?)
    }
}

/// Parse an optional hex SHA-1 from a descriptor, dropping malformed values.
pub(crate) fn digest(sha1: Option<&str>) -> Option<ExpectedDigest> {
    let hex = sha1?;
    match ExpectedDigest::from_hex(hex) {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::warn!(sha1 = hex, error = %e, "ignoring malformed checksum");
            None
        }
    }
}

/// `Cancelled` once the token has fired. Stages call this between files.
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(InstallError::Cancelled);
    }
    Ok(())
}
