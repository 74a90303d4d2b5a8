use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::ExtractOptions;

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub resolved: PathBuf,
}

/// Sanitize an entry name for extraction under `base`.
///
/// Backslashes are treated as separators and the normalized entry path
/// must stay strictly inside `base`. With `flatten`, the contained path is
/// then collapsed to its file name directly under `base`.
pub fn sanitize_path(entry_name: &str, base: &Path, options: &ExtractOptions) -> Result<SanitizedPath> {
    if entry_name.contains('\0') {
        return Err(Error::InvalidPath);
    }

    let original = PathBuf::from(entry_name.replace('\\', "/"));

    let escape = || Error::ZipSlip {
        entry: original.clone(),
        base: base.to_path_buf(),
    };

    let mut resolved = provis_fs::resolve_within(base, &original).map_err(|_| escape())?;
    if options.flatten {
        let name = resolved.file_name().ok_or_else(escape)?;
        resolved = base.join(name);
    }

    Ok(SanitizedPath { original, resolved })
}
