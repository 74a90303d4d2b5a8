use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

static COORDINATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<group>[^:@\s]+):(?P<artifact>[^:@\s]+):(?P<version>[^:@\s]+)(?::(?P<classifier>[^:@\s]+))?(?:@(?P<ext>[A-Za-z0-9]+))?$")
        .unwrap()
});

/// A Maven coordinate `group:artifact:version[:classifier][@ext]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl Coordinate {
    pub fn parse(s: &str) -> Result<Self> {
        let caps = COORDINATE
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidCoordinate(s.to_string()))?;
        Ok(Self {
            group: caps["group"].to_string(),
            artifact: caps["artifact"].to_string(),
            version: caps["version"].to_string(),
            classifier: caps.name("classifier").map(|m| m.as_str().to_string()),
            extension: caps.name("ext").map_or("jar", |m| m.as_str()).to_string(),
        })
    }

    /// Same artifact with a different classifier.
    pub fn with_classifier(&self, classifier: impl Into<String>) -> Self {
        Self {
            classifier: Some(classifier.into()),
            ..self.clone()
        }
    }

    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!(
                "{}-{}-{}.{}",
                self.artifact, self.version, classifier, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Repository-relative path with `/` separators.
    pub fn relative_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.file_name()
        )
    }

    /// Destination under `root`, rejecting coordinates whose segments would
    /// leave it.
    pub fn path_in(&self, root: &Path) -> Result<PathBuf> {
        Ok(provis_fs::resolve_within(root, self.relative_path())?)
    }

    /// Download URL against a repository base, with or without a trailing `/`.
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.relative_path())
    }

    /// Whether the group lives in `namespace` (`net.fabricmc` matches
    /// `net.fabricmc` and `net.fabricmc.fabric-api`).
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.group == namespace
            || self
                .group
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
