use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// A leading `..` that has nothing left to pop is kept, so the result of
/// joining an escaping path onto a root will no longer start with that root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}

/// Join `relative` onto `root` and ensure the result stays strictly inside it.
pub fn resolve_within(root: &Path, relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let root = normalize_path(root);

    if relative.is_absolute() || relative.has_root() {
        return Err(Error::OutsideRoot {
            path: relative.to_path_buf(),
            root,
        });
    }

    let resolved = normalize_path(&root.join(relative));
    if resolved == root || !resolved.starts_with(&root) {
        return Err(Error::OutsideRoot { path: resolved, root });
    }

    Ok(resolved)
}
