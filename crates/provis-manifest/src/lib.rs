//! Descriptor model for provisioning a game client.
//!
//! - [`VersionIndex`] / [`VersionDescriptor`] - the top-level index and per-version metadata
//! - [`LibraryDescriptor`] - structured downloads or Maven coordinates, gated by [`PlatformRule`]s
//! - [`AssetIndex`] - logical asset names mapped onto content-addressed objects
//! - [`rules::include`] - the platform rule fold
//! - [`Platform`] - the rule/classifier view of the running machine

pub use self::assets::{AssetIndex, AssetIndexRef, AssetObject};
pub use self::descriptor::{Download, VersionDescriptor};
pub use self::error::{Error, Result};
pub use self::index::{Latest, VersionIndex, VersionRef};
pub use self::library::{
    Artifact, ArtifactLocation, ExtractRules, LibraryDescriptor, LibraryDownloads, Repositories,
};
pub use self::maven::Coordinate;
pub use self::platform::Platform;
pub use self::rules::{OsRule, PlatformRule, RuleAction, Verdict};

mod assets;
mod descriptor;
mod error;
mod index;
mod library;
mod maven;
mod platform;
pub mod rules;
