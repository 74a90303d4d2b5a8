//! Version index lookup and descriptor resolution.

use provis_fetch::HttpClient;
use provis_manifest::{VersionDescriptor, VersionIndex};

use crate::context::digest;
use crate::{Context, InstallError, Layout, Result};

pub async fn fetch_index<C: HttpClient>(ctx: &Context<C>) -> Result<VersionIndex> {
    let url = &ctx.config.version_manifest_url;
    tracing::debug!(url = %url, "fetching version index");
    let bytes = ctx.fetcher.fetch_bytes(url, &ctx.fetch_options()).await?;
    Ok(VersionIndex::from_slice(&bytes)?)
}

/// Resolve `version_id` over the network and persist its descriptor.
///
/// This never consults the local copy; callers that want to avoid the
/// round-trip check [`load_local`] first.
pub async fn resolve<C: HttpClient>(ctx: &Context<C>, version_id: &str) -> Result<VersionDescriptor> {
    let index = fetch_index(ctx).await?;
    let entry = index.find(version_id).ok_or_else(|| InstallError::NotFound {
        what: "version",
        id: version_id.to_string(),
    })?;

    tracing::debug!(url = %entry.url, "fetching version descriptor");
    let options = ctx.fetch_options().sha1(digest(entry.sha1.as_deref()));
    let bytes = ctx.fetcher.fetch_bytes(&entry.url, &options).await?;
    let descriptor = VersionDescriptor::from_slice(&bytes)?;

    let path = ctx.layout.descriptor(version_id)?;
    provis_fs::atomic_write(&path, &bytes)?;
    tracing::info!(version = version_id, path = %path.display(), "resolved version descriptor");

    Ok(descriptor)
}

/// A previously persisted descriptor, if one exists and still parses.
pub fn load_local(layout: &Layout, version_id: &str) -> Result<Option<VersionDescriptor>> {
    let path = layout.descriptor(version_id)?;
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(InstallError::io(&path)(e)),
    };

    match VersionDescriptor::from_slice(&bytes) {
        Ok(descriptor) => Ok(Some(descriptor)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable local descriptor");
            Ok(None)
        }
    }
}
