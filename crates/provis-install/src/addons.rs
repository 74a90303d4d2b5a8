//! Best-effort add-on installation from a package registry.

use std::path::{Path, PathBuf};

use provis_fetch::{CancellationToken, HttpClient};
use serde::Deserialize;

use crate::context::digest;
use crate::loader::LOADER_NAME;
use crate::{Context, InstallError, Result};

/// An optional component identified by its registry slug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddonDescriptor {
    pub slug: String,
    pub display_name: String,
    /// Direct download, bypassing the registry lookup.
    pub artifact_url: Option<String>,
}

impl AddonDescriptor {
    /// An add-on looked up by `slug`, displayed under the slug too.
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            display_name: slug.clone(),
            slug,
            artifact_url: None,
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn artifact_url(mut self, url: impl Into<String>) -> Self {
        self.artifact_url = Some(url.into());
        self
    }
}

/// Outcome of [`install_all`], by display name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddonReport {
    pub installed: Vec<String>,
    pub already_present: Vec<String>,
    /// Essential add-ons that could not be installed.
    pub failed: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RegistryVersion {
    #[serde(default)]
    files: Vec<RegistryFile>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    url: String,
    filename: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    hashes: RegistryHashes,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryHashes {
    sha1: Option<String>,
}

/// Suffix of the fetcher's in-flight staging files.
const PARTIAL_SUFFIX: &str = ".part";

/// Registry query for builds of `slug` compatible with the game version
/// and the loader.
pub fn registry_query_url(base: &str, slug: &str, game_version: &str) -> String {
    format!(
        "{}/v2/project/{slug}/version?game_versions=%5B%22{game_version}%22%5D&loaders=%5B%22{LOADER_NAME}%22%5D",
        base.trim_end_matches('/')
    )
}

/// Lowercase alphanumerics only, so `Fabric API`, `fabric-api` and
/// `fabric_api` compare equal.
fn squash(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A file in `dir` whose name contains the add-on's display name or slug.
/// Hidden files and partial downloads never count.
pub fn find_existing(dir: &Path, addon: &AddonDescriptor) -> Result<Option<PathBuf>> {
    let needles: Vec<String> = [&addon.display_name, &addon.slug]
        .into_iter()
        .map(|s| squash(s))
        .filter(|s| !s.is_empty())
        .collect();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(InstallError::io(dir)(e)),
    };
    for entry in entries {
        let path = entry.map_err(InstallError::io(dir))?.path();
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if file_name.starts_with('.') || file_name.ends_with(PARTIAL_SUFFIX) || !path.is_file() {
            continue;
        }
        let name = squash(&file_name);
        if needles.iter().any(|needle| name.contains(needle.as_str())) {
            return Ok(Some(path));
        }
    }

    Ok(None)
}

/// Install `addons` in priority order. Never fails: errors are logged, and
/// recorded in `failed` only for the first `essential` entries.
pub async fn install_all<C: HttpClient>(
    ctx: &Context<C>,
    addons: &[AddonDescriptor],
    game_version: &str,
    essential: usize,
    cancel: &CancellationToken,
    mut on_progress: impl FnMut(&str, usize, usize),
) -> AddonReport {
    let dir = ctx.layout.addons();
    let total = addons.len();
    let mut report = AddonReport::default();

    for (index, addon) in addons.iter().enumerate() {
        if cancel.is_cancelled() {
            break;
        }
        on_progress(&addon.display_name, index, total);

        let result = match find_existing(&dir, addon) {
            Ok(Some(path)) => {
                tracing::debug!(addon = %addon.slug, path = %path.display(), "add-on already present");
                report.already_present.push(addon.display_name.clone());
                continue;
            }
            Ok(None) => install_one(ctx, addon, &dir, game_version).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(path) => {
                tracing::info!(addon = %addon.slug, path = %path.display(), "add-on installed");
                report.installed.push(addon.display_name.clone());
            }
            Err(e) if index < essential => {
                tracing::warn!(addon = %addon.slug, error = %e, "essential add-on failed");
                report.failed.push(addon.display_name.clone());
            }
            Err(e) => tracing::debug!(addon = %addon.slug, error = %e, "optional add-on skipped"),
        }
    }

    on_progress("", total, total);
    report
}

async fn install_one<C: HttpClient>(
    ctx: &Context<C>,
    addon: &AddonDescriptor,
    dir: &Path,
    game_version: &str,
) -> Result<PathBuf> {
    let (url, filename, size, sha1) = match &addon.artifact_url {
        Some(url) => {
            let filename = url
                .split(['?', '#'])
                .next()
                .and_then(|path| path.rsplit('/').next())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .ok_or_else(|| InstallError::malformed("add-on url", url))?;
            (url.clone(), filename, None, None)
        }
        None => {
            let file = lookup(ctx, addon, game_version).await?;
            (file.url, file.filename, file.size, file.hashes.sha1)
        }
    };

    let path = provis_fs::resolve_within(dir, &filename)?;
    let options = ctx.fetch_options().expected_size(size).sha1(digest(sha1.as_deref()));
    ctx.fetcher.fetch(&url, &path, &options).await?;

    Ok(path)
}

/// Newest compatible build's primary file, or its first file when none is
/// marked primary.
async fn lookup<C: HttpClient>(ctx: &Context<C>, addon: &AddonDescriptor, game_version: &str) -> Result<RegistryFile> {
    let url = registry_query_url(&ctx.config.addon_registry_url, &addon.slug, game_version);
    let bytes = ctx.fetcher.fetch_bytes(&url, &ctx.fetch_options()).await?;
    let versions: Vec<RegistryVersion> =
        serde_json::from_slice(&bytes).map_err(|e| InstallError::malformed("registry response", e))?;

    let not_found = || InstallError::NotFound {
        what: "compatible build of",
        id: addon.slug.clone(),
    };
    let mut files = versions.into_iter().next().ok_or_else(not_found)?.files;
    let position = files.iter().position(|file| file.primary).unwrap_or(0);
    if files.is_empty() {
        return Err(not_found());
    }
    Ok(files.swap_remove(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstallerConfig;
    use provis_fetch::MemoryClient;

    const REGISTRY: &str = "https://registry.invalid";

    fn context(client: MemoryClient, root: &Path) -> Context<MemoryClient> {
        let config = InstallerConfig {
            addon_registry_url: REGISTRY.into(),
            max_retries: 0,
            ..Default::default()
        };
        Context::new(client, config, root)
    }

    #[test]
    fn fuzzy_match_ignores_case_and_separators() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Fabric_API-0.90.0+1.20.1.jar"), b"jar").unwrap();
        let addon = AddonDescriptor::new("fabric-api").display_name("Fabric API");
        assert!(find_existing(dir.path(), &addon).unwrap().is_some());
        assert!(find_existing(dir.path(), &AddonDescriptor::new("sodium")).unwrap().is_none());
    }

    #[tokio::test]
    async fn interrupted_download_is_not_mistaken_for_an_install() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mods")).unwrap();
        std::fs::write(dir.path().join("mods/.sodium-fabric-0.5.3.jar.part"), b"ja").unwrap();
        std::fs::write(dir.path().join("mods/sodium-notes.part"), b"").unwrap();
        let client = MemoryClient::new();
        client.route(
            registry_query_url(REGISTRY, "sodium", "1.20.1"),
            r#"[{"files": [{"url": "https://cdn.invalid/sodium.jar", "filename": "sodium-fabric-0.5.3.jar", "primary": true}]}]"#,
        );
        client.route("https://cdn.invalid/sodium.jar", &b"jar"[..]);
        let ctx = context(client.clone(), dir.path());

        let report = install_all(&ctx, &[AddonDescriptor::new("sodium")], "1.20.1", 1, &CancellationToken::new(), |_, _, _| {})
            .await;

        assert!(report.already_present.is_empty());
        assert_eq!(report.installed, vec!["sodium".to_string()]);
        assert_eq!(std::fs::read(dir.path().join("mods/sodium-fabric-0.5.3.jar")).unwrap(), b"jar");
        assert_eq!(client.requests_for("https://cdn.invalid/sodium.jar"), 1);
    }

    #[tokio::test]
    async fn present_addon_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mods")).unwrap();
        std::fs::write(dir.path().join("mods/sodium-fabric-0.5.3.jar"), b"jar").unwrap();
        let client = MemoryClient::new();
        let ctx = context(client.clone(), dir.path());

        let report = install_all(
            &ctx,
            &[AddonDescriptor::new("sodium").display_name("Sodium")],
            "1.20.1",
            1,
            &CancellationToken::new(),
            |_, _, _| {},
        )
        .await;

        assert_eq!(report.already_present, vec!["Sodium".to_string()]);
        assert!(report.installed.is_empty());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn primary_file_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let client = MemoryClient::new();
        client.route(
            registry_query_url(REGISTRY, "lithium", "1.20.1"),
            r#"[{"files": [
                {"url": "https://cdn.invalid/sources.jar", "filename": "lithium-sources.jar", "primary": false},
                {"url": "https://cdn.invalid/lithium.jar", "filename": "lithium-0.11.2.jar", "primary": true, "size": 3}
            ]}]"#,
        );
        client.route("https://cdn.invalid/lithium.jar", &b"jar"[..]);
        let ctx = context(client, dir.path());

        let report = install_all(&ctx, &[AddonDescriptor::new("lithium")], "1.20.1", 0, &CancellationToken::new(), |_, _, _| {})
            .await;

        assert_eq!(report.installed, vec!["lithium".to_string()]);
        assert!(dir.path().join("mods/lithium-0.11.2.jar").is_file());
        assert!(!dir.path().join("mods/lithium-sources.jar").exists());
    }

    #[tokio::test]
    async fn only_essential_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let client = MemoryClient::new();
        client.unreachable(registry_query_url(REGISTRY, "fabric-api", "1.20.1"));
        client.route(registry_query_url(REGISTRY, "modmenu", "1.20.1"), "[]");
        let ctx = context(client, dir.path());

        let mut seen = Vec::new();
        let report = install_all(
            &ctx,
            &[AddonDescriptor::new("fabric-api"), AddonDescriptor::new("modmenu")],
            "1.20.1",
            1,
            &CancellationToken::new(),
            |name, index, total| seen.push((name.to_string(), index, total)),
        )
        .await;

        assert_eq!(report.failed, vec!["fabric-api".to_string()]);
        assert!(report.installed.is_empty());
        assert_eq!(seen.first(), Some(&("fabric-api".to_string(), 0, 2)));
        assert_eq!(seen.last().map(|s| (s.1, s.2)), Some((2, 2)));
    }

    #[tokio::test]
    async fn escaping_filename_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let client = MemoryClient::new();
        client.route(
            registry_query_url(REGISTRY, "evil", "1.20.1"),
            r#"[{"files": [{"url": "https://cdn.invalid/e.jar", "filename": "../../evil.jar"}]}]"#,
        );
        client.route("https://cdn.invalid/e.jar", &b"jar"[..]);
        let ctx = context(client, dir.path());

        let report = install_all(&ctx, &[AddonDescriptor::new("evil")], "1.20.1", 1, &CancellationToken::new(), |_, _, _| {})
            .await;

        assert_eq!(report.failed, vec!["evil".to_string()]);
        assert!(!dir.path().join("evil.jar").exists());
    }
}
