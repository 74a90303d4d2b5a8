use serde::{Deserialize, Serialize};

use provis_manifest::Platform;

/// Endpoints and knobs for one installer. Every field has a default, so a
/// partial configuration file is always valid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub version_manifest_url: String,
    /// Base of the content-addressed asset object store.
    pub resources_url: String,
    /// Default base for coordinate-derived library URLs.
    pub libraries_url: String,
    /// Base for libraries in the loader's group namespace.
    pub loader_maven_url: String,
    pub loader_meta_url: String,
    pub addon_registry_url: String,
    pub user_agent: String,
    pub max_concurrent_downloads: usize,
    pub max_retries: u32,
    /// Re-hash existing files against known SHA-1s before trusting them.
    pub verify_hashes: bool,
    pub loader_version: String,
    pub addon_slugs: Vec<String>,
    /// How many leading entries of `addon_slugs` count as essential.
    pub essential_addons: usize,
    /// Rule platform name override (`windows`, `linux`, `osx`).
    pub platform: Option<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            version_manifest_url: "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json".into(),
            resources_url: "https://resources.download.minecraft.net/".into(),
            libraries_url: "https://libraries.minecraft.net/".into(),
            loader_maven_url: "https://maven.fabricmc.net/".into(),
            loader_meta_url: "https://meta.fabricmc.net/".into(),
            addon_registry_url: "https://api.modrinth.com/".into(),
            user_agent: concat!("provis/", env!("CARGO_PKG_VERSION")).into(),
            max_concurrent_downloads: 8,
            max_retries: 3,
            verify_hashes: false,
            loader_version: crate::loader::BUNDLED_LOADER_VERSION.into(),
            addon_slugs: Vec::new(),
            essential_addons: 0,
            platform: None,
        }
    }
}

impl InstallerConfig {
    pub fn platform(&self) -> Platform {
        match &self.platform {
            Some(name) => Platform::named(name.as_str()),
            None => Platform::current(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: InstallerConfig =
            serde_json::from_str(r#"{"max_concurrent_downloads": 2, "addon_slugs": ["sodium"]}"#).unwrap();
        assert_eq!(config.max_concurrent_downloads, 2);
        assert_eq!(config.addon_slugs, vec!["sodium".to_string()]);
        assert_eq!(config.libraries_url, InstallerConfig::default().libraries_url);
        assert!(!config.verify_hashes);
    }

    #[test]
    fn platform_override() {
        let config = InstallerConfig {
            platform: Some("osx".into()),
            ..Default::default()
        };
        assert_eq!(config.platform().name, "osx");
    }
}
