use std::path::{Path, PathBuf};

use crate::Result;

/// Directory layout of an installation root.
///
/// ```text
/// <root>/versions/<id>/<id>.json
/// <root>/versions/<id>/<id>.jar
/// <root>/libraries/...
/// <root>/natives/<file>
/// <root>/assets/indexes/<id>.json
/// <root>/assets/objects/<hh>/<hash>
/// <root>/mods/<file>
/// ```
#[derive(Clone, Debug)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`. Nothing is created on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The installation root itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent of every version directory.
    pub fn versions(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// `versions/<id>`. Fails with `PathViolation` when `id` would escape
    /// `versions/`.
    pub fn version_dir(&self, id: &str) -> Result<PathBuf> {
        Ok(provis_fs::resolve_within(&self.versions(), id)?)
    }

    /// `versions/<id>/<id>.json`
    pub fn descriptor(&self, id: &str) -> Result<PathBuf> {
        Ok(self.version_dir(id)?.join(format!("{id}.json")))
    }

    /// `versions/<id>/<id>.jar`, the primary binary of a version.
    pub fn client_jar(&self, id: &str) -> Result<PathBuf> {
        Ok(self.version_dir(id)?.join(format!("{id}.jar")))
    }

    /// Root of the Maven-style library tree.
    pub fn libraries(&self) -> PathBuf {
        self.root.join("libraries")
    }

    /// Flat directory of extracted native binaries.
    pub fn natives(&self) -> PathBuf {
        self.root.join("natives")
    }

    /// `assets/indexes/<id>.json`, contained like [`version_dir`](Self::version_dir).
    pub fn asset_index(&self, id: &str) -> Result<PathBuf> {
        let indexes = self.root.join("assets").join("indexes");
        Ok(provis_fs::resolve_within(&indexes, format!("{id}.json"))?)
    }

    /// Content-addressed object store, `<hh>/<hash>` below it.
    pub fn asset_objects(&self) -> PathBuf {
        self.root.join("assets").join("objects")
    }

    /// Where add-on jars are installed.
    pub fn addons(&self) -> PathBuf {
        self.root.join("mods")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InstallError;

    #[test]
    fn version_files_live_in_their_directory() {
        let layout = Layout::new("/game");
        assert_eq!(
            layout.client_jar("1.20.1").unwrap(),
            PathBuf::from("/game/versions/1.20.1/1.20.1.jar")
        );
    }

    #[test]
    fn escaping_ids_are_rejected() {
        let layout = Layout::new("/game");
        assert!(matches!(layout.descriptor("../../etc"), Err(InstallError::PathViolation { .. })));
        assert!(layout.asset_index("../x").is_err());
    }
}
