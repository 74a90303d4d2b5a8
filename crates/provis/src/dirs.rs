//! Per-user base directories, following each platform's convention.

use std::env;
use std::path::PathBuf;

const APP: &str = "provis";

fn home() -> Option<PathBuf> {
    home::home_dir()
}

fn config_home() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("APPDATA").map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        home().map(|p| p.join("Library/Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|p| p.join(".config")))
    }
}

fn data_home() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var_os("APPDATA").map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        home().map(|p| p.join("Library/Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| home().map(|p| p.join(".local/share")))
    }
}

/// `<config dir>/provis/config.toml`
pub fn config_file() -> Option<PathBuf> {
    config_home().map(|dir| dir.join(APP).join("config.toml"))
}

/// `<data dir>/provis`, the installation root when none is configured.
pub fn default_root() -> Option<PathBuf> {
    data_home().map(|dir| dir.join(APP))
}
