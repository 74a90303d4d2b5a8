use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Coordinate, Platform, PlatformRule, Result, rules};

/// One entry of a descriptor's `libraries` list.
///
/// Libraries come in two shapes: a structured `downloads` record with
/// explicit URLs and paths, or a bare Maven `name` resolved against a
/// repository base (the library's own `url` when it names one).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<PlatformRule>,
    /// Platform name to classifier key, possibly containing `${arch}`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub natives: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub classifiers: BTreeMap<String, Artifact>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Artifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Repository bases used for coordinate-derived URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repositories {
    pub default_base: String,
    pub loader_base: String,
    /// Group namespace served from `loader_base`.
    pub loader_group: String,
}

impl Repositories {
    pub fn new(default_base: impl Into<String>, loader_base: impl Into<String>) -> Self {
        Self {
            default_base: default_base.into(),
            loader_base: loader_base.into(),
            loader_group: "net.fabricmc".to_string(),
        }
    }

    /// The library's own base, then the loader base for the loader
    /// namespace, then the default base.
    pub fn base_for<'a>(&'a self, library: &'a LibraryDescriptor, coord: &Coordinate) -> &'a str {
        match library.url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ if coord.in_namespace(&self.loader_group) => &self.loader_base,
            _ => &self.default_base,
        }
    }
}

/// A concrete file to have on disk: where it comes from and where it goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub url: String,
    pub path: PathBuf,
    pub size: Option<u64>,
    pub sha1: Option<String>,
}

impl LibraryDescriptor {
    pub fn coordinate(&self) -> Result<Coordinate> {
        Coordinate::parse(&self.name)
    }

    pub fn is_included(&self, platform: &Platform) -> bool {
        rules::include(&self.rules, platform)
    }

    /// Main artifact of the library. `None` for natives-only entries that
    /// only carry classifier downloads.
    pub fn artifact(&self, root: &Path, repos: &Repositories) -> Result<Option<ArtifactLocation>> {
        match &self.downloads {
            Some(LibraryDownloads { artifact: Some(artifact), .. }) => {
                self.structured(artifact, None, root, repos).map(Some)
            }
            Some(LibraryDownloads { artifact: None, classifiers }) if !classifiers.is_empty() => {
                Ok(None)
            }
            _ => {
                let coord = self.coordinate()?;
                Ok(Some(ArtifactLocation {
                    url: coord.url(repos.base_for(self, &coord)),
                    path: coord.path_in(root)?,
                    size: self.size,
                    sha1: self.sha1.clone(),
                }))
            }
        }
    }

    /// Classifier carrying native binaries for `platform`, with `${arch}`
    /// replaced by the pointer width.
    pub fn native_classifier(&self, platform: &Platform) -> Option<String> {
        self.natives
            .get(&platform.name)
            .map(|classifier| classifier.replace("${arch}", &platform.bits))
    }

    pub fn native_artifact(
        &self,
        platform: &Platform,
        root: &Path,
        repos: &Repositories,
    ) -> Result<Option<ArtifactLocation>> {
        let Some(classifier) = self.native_classifier(platform) else {
            return Ok(None);
        };
        let structured = self
            .downloads
            .as_ref()
            .and_then(|downloads| downloads.classifiers.get(&classifier));
        match structured {
            Some(artifact) => self.structured(artifact, Some(&classifier), root, repos).map(Some),
            None => {
                let coord = self.coordinate()?.with_classifier(classifier);
                Ok(Some(ArtifactLocation {
                    url: coord.url(repos.base_for(self, &coord)),
                    path: coord.path_in(root)?,
                    size: None,
                    sha1: None,
                }))
            }
        }
    }

    /// Archive entry prefixes never extracted from native archives.
    pub fn extract_excludes(&self) -> Vec<String> {
        self.extract
            .as_ref()
            .map(|extract| extract.exclude.clone())
            .unwrap_or_default()
    }

    // Structured records may omit the path or the URL; the coordinate fills
    // in whichever is missing.
    fn structured(
        &self,
        artifact: &Artifact,
        classifier: Option<&str>,
        root: &Path,
        repos: &Repositories,
    ) -> Result<ArtifactLocation> {
        let coord = || -> Result<Coordinate> {
            let coord = self.coordinate()?;
            Ok(match classifier {
                Some(classifier) => coord.with_classifier(classifier),
                None => coord,
            })
        };

        let path = match artifact.path.as_deref() {
            Some(path) if !path.is_empty() => provis_fs::resolve_within(root, path)?,
            _ => coord()?.path_in(root)?,
        };
        let url = if artifact.url.is_empty() {
            let coord = coord()?;
            coord.url(repos.base_for(self, &coord))
        } else {
            artifact.url.clone()
        };

        Ok(ArtifactLocation {
            url,
            path,
            size: artifact.size,
            sha1: artifact.sha1.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repos() -> Repositories {
        Repositories::new("https://libraries.invalid/", "https://loader.invalid/")
    }

    fn root() -> PathBuf {
        PathBuf::from("/game/libraries")
    }

    fn parse(json: &str) -> LibraryDescriptor {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn structured_artifact_is_used_verbatim() {
        let lib = parse(
            r#"{
                "name": "com.mojang:brigadier:1.0.18",
                "downloads": {"artifact": {
                    "path": "com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar",
                    "url": "https://cdn.invalid/brigadier.jar",
                    "sha1": "c1ef1234", "size": 77392
                }}
            }"#,
        );
        let location = lib.artifact(&root(), &repos()).unwrap().unwrap();
        assert_eq!(location.url, "https://cdn.invalid/brigadier.jar");
        assert_eq!(location.path, root().join("com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar"));
        assert_eq!(location.size, Some(77392));
    }

    #[test]
    fn coordinate_base_priority() {
        let own = parse(r#"{"name": "org.ow2.asm:asm:9.6", "url": "https://own.invalid"}"#);
        let loader = parse(r#"{"name": "net.fabricmc:intermediary:1.20.1"}"#);
        let plain = parse(r#"{"name": "org.ow2.asm:asm:9.6"}"#);

        let url = |lib: &LibraryDescriptor| lib.artifact(&root(), &repos()).unwrap().unwrap().url;
        assert_eq!(url(&own), "https://own.invalid/org/ow2/asm/asm/9.6/asm-9.6.jar");
        assert_eq!(
            url(&loader),
            "https://loader.invalid/net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar"
        );
        assert_eq!(url(&plain), "https://libraries.invalid/org/ow2/asm/asm/9.6/asm-9.6.jar");
    }

    #[test]
    fn escaping_structured_path_is_rejected() {
        let lib = parse(
            r#"{"name": "a:b:1", "downloads": {"artifact": {"path": "../../etc/passwd", "url": "https://x.invalid"}}}"#,
        );
        assert!(lib.artifact(&root(), &repos()).is_err());
    }

    #[test]
    fn natives_only_library_has_no_main_artifact() {
        let lib = parse(
            r#"{
                "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
                "natives": {"linux": "natives-linux", "windows": "natives-windows-${arch}"},
                "downloads": {"classifiers": {
                    "natives-linux": {"path": "org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar",
                                      "url": "https://cdn.invalid/natives-linux.jar", "size": 10}
                }},
                "extract": {"exclude": ["META-INF/"]}
            }"#,
        );
        assert_eq!(lib.artifact(&root(), &repos()).unwrap(), None);
        assert_eq!(lib.extract_excludes(), vec!["META-INF/".to_string()]);

        let linux = lib.native_artifact(&Platform::named("linux"), &root(), &repos()).unwrap().unwrap();
        assert_eq!(linux.url, "https://cdn.invalid/natives-linux.jar");

        let mut windows = Platform::named("windows");
        windows.bits = "64".into();
        assert_eq!(lib.native_classifier(&windows).as_deref(), Some("natives-windows-64"));
        let derived = lib.native_artifact(&windows, &root(), &repos()).unwrap().unwrap();
        assert!(derived.url.ends_with("lwjgl-platform-2.9.4-natives-windows-64.jar"));

        assert_eq!(lib.native_artifact(&Platform::named("osx"), &root(), &repos()).unwrap(), None);
    }
}
