use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, error};

/// Reference from a version descriptor to its asset index document.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

/// Logical asset name to content-addressed object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: BTreeMap<String, AssetObject>,
    #[serde(default, rename = "virtual", skip_serializing_if = "std::ops::Not::not")]
    pub is_virtual: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub map_to_resources: bool,
}

impl AssetIndex {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(error::json("asset index"))
    }

    /// Distinct objects, one per hash, in logical-name order of first use.
    pub fn unique_objects(&self) -> Vec<&AssetObject> {
        let mut seen = HashSet::new();
        self.objects
            .values()
            .filter(|object| seen.insert(object.hash.as_str()))
            .collect()
    }
}

impl AssetObject {
    fn prefix(&self) -> Result<&str> {
        let valid = self.hash.len() >= 2 && self.hash.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(Error::InvalidHash(self.hash.clone()));
        }
        Ok(&self.hash[..2])
    }

    /// `objects_root/<hh>/<hash>`.
    pub fn path_in(&self, objects_root: &Path) -> Result<PathBuf> {
        let prefix = self.prefix()?;
        Ok(provis_fs::resolve_within(objects_root, format!("{prefix}/{}", self.hash))?)
    }

    /// `<base>/<hh>/<hash>`.
    pub fn url(&self, base: &str) -> Result<String> {
        let prefix = self.prefix()?;
        Ok(format!("{}/{prefix}/{}", base.trim_end_matches('/'), self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"{"objects": {
        "icons/icon_16x16.png": {"hash": "bdf48ef6b5d0d23bbb02e17d04865216179f510a", "size": 3665},
        "icons/icon_32x32.png": {"hash": "92750c5f93c312ba9ab413d546f32190c56d6f1f", "size": 5362},
        "minecraft/icons/icon_16x16.png": {"hash": "bdf48ef6b5d0d23bbb02e17d04865216179f510a", "size": 3665}
    }}"#;

    #[test]
    fn shared_hashes_collapse() {
        let index = AssetIndex::from_slice(INDEX.as_bytes()).unwrap();
        assert_eq!(index.objects.len(), 3);
        assert_eq!(index.unique_objects().len(), 2);
    }

    #[test]
    fn object_layout_uses_hash_prefix() {
        let object = AssetObject {
            hash: "bdf48ef6b5d0d23bbb02e17d04865216179f510a".into(),
            size: 3665,
        };
        assert_eq!(
            object.path_in(Path::new("/game/assets/objects")).unwrap(),
            PathBuf::from("/game/assets/objects/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a")
        );
        assert_eq!(
            object.url("https://resources.invalid/").unwrap(),
            "https://resources.invalid/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a"
        );
    }

    #[test]
    fn non_hex_hash_is_rejected() {
        for hash in ["", "a", "../../etc", "zz00"] {
            let object = AssetObject { hash: hash.into(), size: 0 };
            assert!(object.path_in(Path::new("/objects")).is_err(), "{hash}");
        }
    }
}
