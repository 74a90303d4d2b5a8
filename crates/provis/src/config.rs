use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use provis_install::InstallerConfig;
use serde::Deserialize;

use crate::dirs;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(flatten)]
    pub installer: InstallerConfig,
}

impl Settings {
    pub fn root(&self) -> Option<PathBuf> {
        self.root.clone().or_else(dirs::default_root)
    }
}

/// Defaults, then the TOML file, then `PROVIS_*` environment variables.
pub fn load(path: Option<&Path>) -> Result<Settings, figment::Error> {
    let mut figment = Figment::new();
    if let Some(path) = path.map(Path::to_path_buf).or_else(dirs::config_file) {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(Env::prefixed("PROVIS_")).extract()
}
