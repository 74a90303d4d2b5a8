//! Filesystem primitives shared by the provisioning stages.
//!
//! - [`atomic_write`] persists descriptors and indexes without leaving torn files.
//! - [`check_file`] is the "already installed" predicate.
//! - [`resolve_within`] enforces that resolved paths stay inside their root.

mod error;
mod path;

pub use error::{Error, Result};
pub use path::{normalize_path, resolve_within};

use std::fs::File;
use std::path::Path;

use provis_verify::{ExpectedDigest, Sha1Hasher, VerifiedReader};

/// Write `content` to a hidden `.<name>.tmp` sibling of `path` and rename
/// it into place.
///
/// Parent directories are created as needed.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().unwrap_or(Path::new(""));
    if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent).map_err(error::at(parent))?;
    }

    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let tmp_path = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&tmp_path, content).map_err(error::at(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(error::at(path))?;

    Ok(())
}

/// Hardlink `src` to `dest`, copying instead when linking is not possible
/// (another filesystem, or no link support). An existing `dest` is an error.
pub fn hardlink_or_copy(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(error::at(parent))?;
    }

    match std::fs::hard_link(src, dest) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::Io {
                path: dest.to_path_buf(),
                source: e,
            });
        }
        Err(_) => {}
    }

    std::fs::copy(src, dest).map_err(error::at(dest))?;
    Ok(())
}

/// Decide whether `file` is already installed.
///
/// Missing files are never installed. When `size` is known it must match.
/// When `sha1` is given the content is hashed as well, which is the strict
/// mode; callers pass `None` to keep the cheap existence/size check.
pub fn check_file(file: &Path, size: Option<u64>, sha1: Option<&ExpectedDigest>) -> Result<bool> {
    let metadata = match file.metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(Error::Io {
                path: file.to_path_buf(),
                source: e,
            });
        }
    };

    if !metadata.is_file() {
        return Ok(false);
    }

    if let Some(size) = size {
        if metadata.len() != size {
            return Ok(false);
        }
    }

    let Some(expected) = sha1 else {
        return Ok(true);
    };

    let reader = File::open(file).map_err(error::at(file))?;
    let mut verified = VerifiedReader::new(reader, Sha1Hasher::new());
    std::io::copy(&mut verified, &mut std::io::sink()).map_err(error::at(file))?;

    Ok(verified.finish(expected).is_ok())
}
