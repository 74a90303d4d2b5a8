use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "provis", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file [default: <config dir>/provis/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Installation root [default: <data dir>/provis]
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// More logging; repeat for trace output
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "i", name = "install", about = "Install a version with its loader and add-ons")]
    Install(InstallArg),
    #[command(alias = "ls", name = "versions", about = "List installable versions")]
    Versions(VersionsArg),
    #[command(alias = "cp", name = "classpath", about = "Print the classpath of an installed version")]
    Classpath(ClasspathArg),
}

#[derive(Clone, Debug, Args)]
pub struct InstallArg {
    /// Game version id, e.g. `1.20.1`
    #[arg(value_name = "VERSION")]
    pub version_id: String,

    #[arg(long)]
    pub loader_version: Option<String>,

    /// Registry slug of an add-on to install; may be repeated
    #[arg(long = "addon", value_name = "SLUG")]
    pub addons: Vec<String>,

    /// Re-hash existing files instead of trusting their size
    #[arg(long)]
    pub verify: bool,
}

#[derive(Clone, Debug, Args)]
pub struct VersionsArg {
    /// Include snapshots and old versions
    #[arg(long)]
    pub all: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ClasspathArg {
    #[arg(value_name = "VERSION")]
    pub version_id: String,
}
