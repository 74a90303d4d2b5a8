//! Library expansion, download and classpath resolution.

use std::collections::HashSet;
use std::path::PathBuf;

use provis_fetch::{CancellationToken, DownloadJob, HttpClient};
use provis_manifest::{ArtifactLocation, LibraryDescriptor, VersionDescriptor};

use crate::context::{check_cancelled, digest};
use crate::progress::Reporter;
use crate::{Context, InstallError, Result, StageOutcome};

/// A library file that is not on disk yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDownload {
    /// Library coordinate, for logs.
    pub name: String,
    pub location: ArtifactLocation,
}

impl PendingDownload {
    fn job(&self) -> DownloadJob {
        DownloadJob::new(&self.name, &self.location.url, &self.location.path)
            .size(self.location.size)
            .sha1(digest(self.location.sha1.as_deref()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    pub pending: Vec<PendingDownload>,
    /// Libraries whose location could not be derived.
    pub invalid: usize,
}

/// Counts of a best-effort batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub downloaded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn absorb(&mut self, other: BatchSummary) {
        self.downloaded += other.downloaded;
        self.failed += other.failed;
    }
}

/// Expand `libraries` into the files still missing under the library root.
///
/// Excluded libraries and files already present are left out. A library
/// whose location cannot be derived is logged, counted and skipped.
pub fn resolve<C: HttpClient>(ctx: &Context<C>, libraries: &[LibraryDescriptor]) -> Result<Resolution> {
    let root = ctx.layout.libraries();
    let mut resolution = Resolution::default();
    let mut seen = HashSet::new();

    for library in libraries.iter().filter(|lib| lib.is_included(&ctx.platform)) {
        let location = match library.artifact(&root, &ctx.repos) {
            Ok(Some(location)) => location,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(library = %library.name, error = %e, "skipping library");
                resolution.invalid += 1;
                continue;
            }
        };

        if !seen.insert(location.path.clone()) {
            continue;
        }
        if ctx.is_present(&location.path, location.size, location.sha1.as_deref())? {
            tracing::trace!(library = %library.name, "already present");
            continue;
        }

        resolution.pending.push(PendingDownload {
            name: library.name.clone(),
            location,
        });
    }

    Ok(resolution)
}

/// Download `pending` concurrently. Individual failures are logged and
/// counted; only cancellation aborts.
pub async fn download<C: HttpClient>(
    ctx: &Context<C>,
    pending: Vec<PendingDownload>,
    reporter: &mut Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<BatchSummary> {
    if pending.is_empty() {
        return Ok(BatchSummary::default());
    }

    let jobs = pending.iter().map(PendingDownload::job).collect();
    let mut summary = BatchSummary::default();
    ctx.fetcher
        .fetch_all(jobs, &ctx.batch_options(), &ctx.fetch_options(), cancel, |outcome, done, total| {
            match &outcome.result {
                Ok(_) => summary.downloaded += 1,
                Err(e) => {
                    tracing::warn!(library = %outcome.id, error = %e, "library download failed");
                    summary.failed += 1;
                }
            }
            reporter.count(done, total);
            reporter.status(&format!("Downloading libraries {done}/{total}"));
        })
        .await;

    check_cancelled(cancel)?;
    tracing::info!(downloaded = summary.downloaded, failed = summary.failed, "libraries downloaded");
    Ok(summary)
}

/// Fetch the version's primary binary. Unlike libraries this is essential.
pub async fn download_client<C: HttpClient>(
    ctx: &Context<C>,
    descriptor: &VersionDescriptor,
) -> Result<StageOutcome<u64>> {
    let client = descriptor
        .client()
        .ok_or_else(|| InstallError::malformed("version descriptor", "no client download"))?;
    let path = ctx.layout.client_jar(&descriptor.id)?;

    if ctx.is_present(&path, client.size, client.sha1.as_deref())? {
        return Ok(StageOutcome::AlreadySatisfied);
    }

    let options = ctx
        .fetch_options()
        .expected_size(client.size)
        .sha1(digest(client.sha1.as_deref()));
    let written = ctx.fetcher.fetch(&client.url, &path, &options).await?;
    tracing::info!(version = %descriptor.id, bytes = written, "client downloaded");

    Ok(StageOutcome::Done(written))
}

/// Installed library files for `descriptor`, followed by its primary binary.
///
/// Only files that exist are returned; nothing is re-verified.
pub fn resolve_classpath<C: HttpClient>(
    ctx: &Context<C>,
    descriptor: &VersionDescriptor,
) -> Result<Vec<PathBuf>> {
    let root = ctx.layout.libraries();
    let mut seen = HashSet::new();
    let mut classpath = Vec::new();

    for library in descriptor.libraries.iter().filter(|lib| lib.is_included(&ctx.platform)) {
        let Ok(Some(location)) = library.artifact(&root, &ctx.repos) else {
            continue;
        };
        if location.path.is_file() && seen.insert(location.path.clone()) {
            classpath.push(location.path);
        }
    }

    let client = ctx.layout.client_jar(&descriptor.id)?;
    if client.is_file() {
        classpath.push(client);
    }

    Ok(classpath)
}
