//! Native binary extraction.

use std::path::Path;

use provis_archive::{EscapePolicy, ExtractOptions};
use provis_fetch::{CancellationToken, HttpClient};
use provis_manifest::{LibraryDescriptor, Platform};

use crate::context::{check_cancelled, digest};
use crate::progress::Reporter;
use crate::{Context, InstallError, Result, StageOutcome};

/// Archive prefix never extracted from native archives.
const METADATA_PREFIX: &str = "META-INF/";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NativesSummary {
    pub archives: usize,
    pub extracted: usize,
    /// Entries dropped because they would have escaped the natives root.
    pub rejected: usize,
    pub failed: usize,
}

/// Whether `dir` already holds a native binary for `platform`.
///
/// Any single match counts, so a half-extracted directory is treated as
/// complete.
pub fn has_natives(dir: &Path, platform: &Platform) -> Result<bool> {
    let extensions = platform.native_extensions();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(InstallError::io(dir)(e)),
    };

    for entry in entries {
        let path = entry.map_err(InstallError::io(dir))?.path();
        let native = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if native && path.is_file() {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Download the platform classifier archive of every native library and
/// unpack its files directly into the natives root, without the archive's
/// directories.
///
/// Archive failures are logged and counted. Entries that would leave the
/// natives root are dropped without failing the stage.
pub async fn extract<C: HttpClient>(
    ctx: &Context<C>,
    libraries: &[LibraryDescriptor],
    reporter: &mut Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<StageOutcome<NativesSummary>> {
    let natives_root = ctx.layout.natives();
    if has_natives(&natives_root, &ctx.platform)? {
        return Ok(StageOutcome::AlreadySatisfied);
    }

    let libraries_root = ctx.layout.libraries();
    let native_libraries: Vec<_> = libraries
        .iter()
        .filter(|lib| lib.is_included(&ctx.platform) && lib.native_classifier(&ctx.platform).is_some())
        .collect();

    let mut summary = NativesSummary::default();
    let total = native_libraries.len();
    for (done, library) in native_libraries.into_iter().enumerate() {
        check_cancelled(cancel)?;
        match extract_one(ctx, library, &libraries_root, &natives_root).await {
            Ok(report) => {
                summary.archives += 1;
                summary.extracted += report.entry_count;
                summary.rejected += report.rejected.len();
                for entry in &report.rejected {
                    tracing::warn!(library = %library.name, entry = %entry.display(), "dropped escaping archive entry");
                }
            }
            Err(e) => {
                tracing::warn!(library = %library.name, error = %e, "native extraction failed");
                summary.failed += 1;
            }
        }
        reporter.count(done + 1, total);
    }

    tracing::info!(archives = summary.archives, files = summary.extracted, "natives extracted");
    Ok(StageOutcome::Done(summary))
}

async fn extract_one<C: HttpClient>(
    ctx: &Context<C>,
    library: &LibraryDescriptor,
    libraries_root: &Path,
    natives_root: &Path,
) -> Result<provis_archive::ExtractReport> {
    let Some(location) = library.native_artifact(&ctx.platform, libraries_root, &ctx.repos)? else {
        return Ok(Default::default());
    };

    if !ctx.is_present(&location.path, location.size, location.sha1.as_deref())? {
        let options = ctx
            .fetch_options()
            .expected_size(location.size)
            .sha1(digest(location.sha1.as_deref()));
        ctx.fetcher.fetch(&location.url, &location.path, &options).await?;
    }

    let mut options = ExtractOptions::default()
        .files_only(true)
        .flatten(true)
        .on_escape(EscapePolicy::Skip)
        .exclude_prefix(METADATA_PREFIX);
    for prefix in library.extract_excludes() {
        options = options.exclude_prefix(prefix);
    }

    provis_archive::extract_zip_file(&location.path, natives_root, &options)
        .map_err(|e| InstallError::malformed(format!("native archive '{}'", location.path.display()), e))
}
