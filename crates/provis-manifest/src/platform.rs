//! Platform detection in the vocabulary descriptors use.

use std::env;

/// The running machine as seen by library rules and native classifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    /// Rule/classifier OS name: `windows`, `linux` or `osx`.
    pub name: String,
    /// Rule architecture name: `x86`, `x86_64`, `arm32`, `arm64`.
    pub arch: String,
    /// Replacement for the `${arch}` placeholder in native classifiers.
    pub bits: String,
}

impl Platform {
    /// Platform of the running binary, falling back to `linux` for
    /// operating systems descriptors have no name for.
    pub fn current() -> Self {
        let name = match env::consts::OS {
            "windows" => "windows",
            "macos" => "osx",
            _ => "linux",
        };
        Self::named(name)
    }

    /// A platform with the given rule name and the running architecture.
    pub fn named(name: impl Into<String>) -> Self {
        let arch = match env::consts::ARCH {
            "x86" => "x86",
            "x86_64" => "x86_64",
            "arm" => "arm32",
            "aarch64" => "arm64",
            other => other,
        };
        let bits = match env::consts::ARCH {
            "x86" | "arm" => "32",
            _ => "64",
        };
        Self {
            name: name.into(),
            arch: arch.to_string(),
            bits: bits.to_string(),
        }
    }

    /// File extensions of native binaries extracted for this platform.
    pub fn native_extensions(&self) -> &'static [&'static str] {
        match self.name.as_str() {
            "windows" => &["dll"],
            "osx" => &["dylib", "jnilib"],
            _ => &["so"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_has_a_rule_name() {
        let platform = Platform::current();
        assert!(["windows", "linux", "osx"].contains(&platform.name.as_str()));
        assert!(platform.bits == "32" || platform.bits == "64");
    }

    #[test]
    fn native_extensions_per_platform() {
        assert_eq!(Platform::named("windows").native_extensions(), &["dll"]);
        assert_eq!(Platform::named("linux").native_extensions(), &["so"]);
        assert!(Platform::named("osx").native_extensions().contains(&"dylib"));
    }
}
