use serde::{Deserialize, Serialize};

use crate::{Result, error};

/// Top-level list of installable versions.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VersionIndex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<Latest>,
    pub versions: Vec<VersionRef>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Latest {
    pub release: Option<String>,
    pub snapshot: Option<String>,
}

/// One entry of the index: an id and where its descriptor lives.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionRef {
    pub id: String,
    pub url: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

impl VersionIndex {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(error::json("version index"))
    }

    /// Exact id match; the first entry wins when the index repeats an id.
    pub fn find(&self, id: &str) -> Option<&VersionRef> {
        self.versions.iter().find(|v| v.id == id)
    }
}
