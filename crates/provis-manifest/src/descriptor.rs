use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AssetIndexRef, LibraryDescriptor, Result, error};

/// A downloadable file named by kind (`client`, `server`, ...).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Download {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

/// Per-version metadata. Fields this crate does not interpret are kept in
/// `extra` so a persisted descriptor round-trips unchanged.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub downloads: BTreeMap<String, Download>,
    #[serde(default)]
    pub libraries: Vec<LibraryDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VersionDescriptor {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(error::json("version descriptor"))
    }

    pub fn to_vec_pretty(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).map_err(error::json("version descriptor"))
    }

    /// Entry point, treating an empty string as absent.
    pub fn entry_point(&self) -> Option<&str> {
        self.main_class.as_deref().filter(|main| !main.trim().is_empty())
    }

    /// The primary binary artifact.
    pub fn client(&self) -> Option<&Download> {
        self.downloads.get("client")
    }

    /// Layer `self` (an overlay) onto `base`.
    ///
    /// Scalar fields set by the overlay win. Libraries are additive: the
    /// overlay's own libraries come first, followed by every base library.
    pub fn merge_onto(&self, base: &VersionDescriptor) -> VersionDescriptor {
        let mut downloads = base.downloads.clone();
        downloads.extend(self.downloads.clone());

        let mut extra = base.extra.clone();
        extra.extend(self.extra.clone());

        VersionDescriptor {
            id: self.id.clone(),
            main_class: self
                .entry_point()
                .map(str::to_string)
                .or_else(|| base.main_class.clone()),
            inherits_from: None,
            downloads,
            libraries: self.libraries.iter().chain(&base.libraries).cloned().collect(),
            asset_index: self.asset_index.clone().or_else(|| base.asset_index.clone()),
            assets: self.assets.clone().or_else(|| base.assets.clone()),
            extra,
        }
    }
}
