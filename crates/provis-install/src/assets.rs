//! Content-addressed asset synchronization.

use provis_fetch::{CancellationToken, DownloadJob, HttpClient};
use provis_manifest::{AssetIndex, AssetIndexRef};
use provis_verify::ExpectedDigest;

use crate::context::{check_cancelled, digest};
use crate::progress::Reporter;
use crate::{Context, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssetsSummary {
    /// Distinct objects referenced by the index.
    pub objects: usize,
    pub downloaded: usize,
    pub failed: usize,
}

/// How many completions pass between two progress/status updates.
///
/// Large indexes report about every hundredth object; small ones report
/// every object so the caller still sees movement.
pub fn report_interval(total: usize) -> usize {
    (total / 100).clamp(1, 50)
}

/// Load the asset index, from disk when already persisted, from the
/// network otherwise.
pub async fn load_index<C: HttpClient>(ctx: &Context<C>, index_ref: &AssetIndexRef) -> Result<AssetIndex> {
    let path = ctx.layout.asset_index(&index_ref.id)?;
    if ctx.is_present(&path, index_ref.size, index_ref.sha1.as_deref())? {
        match std::fs::read(&path).map(|bytes| AssetIndex::from_slice(&bytes)) {
            Ok(Ok(index)) => return Ok(index),
            Ok(Err(e)) => tracing::warn!(path = %path.display(), error = %e, "refetching unreadable asset index"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "refetching unreadable asset index"),
        }
    }

    let options = ctx
        .fetch_options()
        .expected_size(index_ref.size)
        .sha1(digest(index_ref.sha1.as_deref()));
    let bytes = ctx.fetcher.fetch_bytes(&index_ref.url, &options).await?;
    let index = AssetIndex::from_slice(&bytes)?;
    provis_fs::atomic_write(&path, &bytes)?;

    Ok(index)
}

/// Download every object of the index that is not on disk yet.
///
/// Objects shared by several logical names are fetched once. Per-object
/// failures are logged and counted; only the index itself is required.
pub async fn sync<C: HttpClient>(
    ctx: &Context<C>,
    index_ref: &AssetIndexRef,
    reporter: &mut Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<AssetsSummary> {
    let index = load_index(ctx, index_ref).await?;
    let objects_root = ctx.layout.asset_objects();
    let base = &ctx.config.resources_url;
    let objects = index.unique_objects();

    let mut summary = AssetsSummary {
        objects: objects.len(),
        ..Default::default()
    };
    let mut jobs = Vec::new();
    for object in objects {
        check_cancelled(cancel)?;
        let (path, url) = match (object.path_in(&objects_root), object.url(base)) {
            (Ok(path), Ok(url)) => (path, url),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(hash = %object.hash, error = %e, "skipping asset object");
                summary.failed += 1;
                continue;
            }
        };
        if ctx.is_present(&path, Some(object.size), Some(object.hash.as_str()))? {
            continue;
        }
        let job = DownloadJob::new(&object.hash, url, path)
            .size(Some(object.size))
            .sha1(ExpectedDigest::from_hex(&object.hash).ok());
        jobs.push(job);
    }

    let total = jobs.len();
    tracing::info!(index = %index_ref.id, objects = summary.objects, missing = total, "syncing assets");
    if total == 0 {
        reporter.finish_stage();
        return Ok(summary);
    }

    let interval = report_interval(total);
    reporter.status(&format!("0/{total} files"));
    ctx.fetcher
        .fetch_all(jobs, &ctx.batch_options(), &ctx.fetch_options(), cancel, |outcome, done, total| {
            match &outcome.result {
                Ok(_) => summary.downloaded += 1,
                Err(e) => {
                    tracing::warn!(hash = %outcome.id, error = %e, "asset download failed");
                    summary.failed += 1;
                }
            }
            if done % interval == 0 || done == total {
                reporter.count(done, total);
                reporter.status(&format!("{done}/{total} files"));
            }
        })
        .await;

    check_cancelled(cancel)?;
    Ok(summary)
}
