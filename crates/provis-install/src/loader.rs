//! Loader overlay installation with an offline fallback profile.

use provis_fetch::{CancellationToken, HttpClient};
use provis_manifest::{LibraryDescriptor, VersionDescriptor};

use crate::libraries::{self, BatchSummary};
use crate::progress::Reporter;
use crate::{Context, InstallError, Result, manifest};

/// Loader version of the profile embedded in the binary.
pub const BUNDLED_LOADER_VERSION: &str = "0.15.11";

pub const DEFAULT_MAIN_CLASS: &str = "net.fabricmc.loader.impl.launch.knot.KnotClient";

/// Loader name as the add-on registry spells it.
pub const LOADER_NAME: &str = "fabric";

const LOADER_GROUP: &str = "net.fabricmc";

const BUNDLED_PROFILE: &str = include_str!("../assets/fabric-profile.json");

/// Where the overlay descriptor came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileSource {
    /// A complete overlay was already installed.
    Installed,
    Remote,
    Bundled,
}

#[derive(Clone, Debug)]
pub struct LoaderInstall {
    pub id: String,
    pub source: ProfileSource,
    /// The overlay merged onto its base.
    pub descriptor: VersionDescriptor,
    pub libraries: BatchSummary,
}

/// Version id of the overlay, e.g. `fabric-loader-0.15.11-1.20.1`.
pub fn loader_id(loader_version: &str, game_version: &str) -> String {
    format!("fabric-loader-{loader_version}-{game_version}")
}

/// Meta endpoint serving the overlay profile for a game and loader version.
pub fn profile_url(meta_base: &str, game_version: &str, loader_version: &str) -> String {
    format!(
        "{}/v2/versions/loader/{game_version}/{loader_version}/profile/json",
        meta_base.trim_end_matches('/')
    )
}

/// Install the loader overlay for `base`.
///
/// An overlay already on disk with an entry point is reused without
/// touching the network. Otherwise the remote profile is fetched, falling
/// back to the bundled one; failing both is fatal.
pub async fn install<C: HttpClient>(
    ctx: &Context<C>,
    base: &VersionDescriptor,
    reporter: &mut Reporter<'_>,
    cancel: &CancellationToken,
) -> Result<LoaderInstall> {
    let loader_version = &ctx.config.loader_version;
    let id = loader_id(loader_version, &base.id);

    let (overlay, source) = match manifest::load_local(&ctx.layout, &id)? {
        Some(overlay) if overlay.entry_point().is_some() => (overlay, ProfileSource::Installed),
        _ => {
            reporter.status("Fetching loader profile");
            let (profile, source) = fetch_profile(ctx, &base.id).await?;
            let overlay = normalize(profile, &id, &base.id, &ctx.config.loader_maven_url);
            let path = ctx.layout.descriptor(&id)?;
            let bytes = overlay.to_vec_pretty()?;
            provis_fs::atomic_write(&path, &bytes)?;
            tracing::info!(loader = %id, ?source, "loader profile installed");
            (overlay, source)
        }
    };
    reporter.fraction(0.2);

    copy_client(ctx, &base.id, &id)?;
    reporter.fraction(0.3);

    let resolution = libraries::resolve(ctx, &overlay.libraries)?;
    let mut summary = BatchSummary {
        failed: resolution.invalid,
        ..Default::default()
    };
    if !resolution.pending.is_empty() {
        reporter.status("Downloading loader libraries");
        summary.absorb(libraries::download(ctx, resolution.pending, reporter, cancel).await?);
    }

    Ok(LoaderInstall {
        descriptor: overlay.merge_onto(base),
        id,
        source,
        libraries: summary,
    })
}

async fn fetch_profile<C: HttpClient>(
    ctx: &Context<C>,
    game_version: &str,
) -> Result<(VersionDescriptor, ProfileSource)> {
    let loader_version = &ctx.config.loader_version;
    let url = profile_url(&ctx.config.loader_meta_url, game_version, loader_version);

    let remote = match ctx.fetcher.fetch_bytes(&url, &ctx.fetch_options()).await {
        Ok(bytes) => VersionDescriptor::from_slice(&bytes).map_err(InstallError::from),
        Err(e) => Err(InstallError::from(e)),
    };
    match remote {
        Ok(profile) => return Ok((profile, ProfileSource::Remote)),
        Err(e) => tracing::warn!(url = %url, error = %e, "loader profile unavailable, using bundled profile"),
    }

    if loader_version != BUNDLED_LOADER_VERSION {
        tracing::warn!(
            requested = %loader_version,
            bundled = BUNDLED_LOADER_VERSION,
            "bundled loader profile differs from the requested version"
        );
    }
    let profile = VersionDescriptor::from_slice(BUNDLED_PROFILE.as_bytes())
        .map_err(|e| InstallError::malformed("bundled loader profile", e))?;
    Ok((profile, ProfileSource::Bundled))
}

/// Give the profile its id, base and entry point, and make sure it carries
/// the intermediary mappings for its base.
fn normalize(mut profile: VersionDescriptor, id: &str, base_id: &str, loader_maven: &str) -> VersionDescriptor {
    if profile.id != id {
        tracing::debug!(declared = %profile.id, id, "normalizing loader profile id");
        profile.id = id.to_string();
    }
    if profile.inherits_from.as_deref().is_none_or(str::is_empty) {
        profile.inherits_from = Some(base_id.to_string());
    }
    if profile.entry_point().is_none() {
        profile.main_class = Some(DEFAULT_MAIN_CLASS.to_string());
    }

    let intermediary = format!("{LOADER_GROUP}:intermediary:");
    if !profile.libraries.iter().any(|lib| lib.name.starts_with(&intermediary)) {
        profile.libraries.push(LibraryDescriptor {
            name: format!("{intermediary}{base_id}"),
            url: Some(loader_maven.to_string()),
            ..Default::default()
        });
    }

    profile
}

/// The overlay reuses the base binary under its own id. A copy whose size
/// no longer matches the base is stale and replaced.
fn copy_client<C: HttpClient>(ctx: &Context<C>, base_id: &str, id: &str) -> Result<()> {
    let source = ctx.layout.client_jar(base_id)?;
    let target = ctx.layout.client_jar(id)?;
    let size = std::fs::metadata(&source).map_err(InstallError::io(&source))?.len();

    if provis_fs::check_file(&target, Some(size), None)? {
        return Ok(());
    }
    if target.exists() {
        tracing::debug!(path = %target.display(), "replacing stale loader binary");
        std::fs::remove_file(&target).map_err(InstallError::io(&target))?;
    }

    provis_fs::hardlink_or_copy(&source, &target)?;
    Ok(())
}
