use crate::config::types::{Result, TransboxError};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Remove a file or directory tree without following a symlink at `path`.
/// A symlink is unlinked itself; its target is left untouched. Directory
/// contents are removed with `remove_dir_all`, which does not traverse
/// symlinks found inside the tree.
pub fn remove_tree_secure(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(TransboxError::Filesystem(format!(
                "lstat failed for {}: {}",
                path.display(),
                e
            )))
        }
    };

    let outcome = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransboxError::Filesystem(format!(
            "remove failed for {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Like [`remove_tree_secure`], but refuses paths that do not live under `root`.
pub fn remove_tree_within(root: &Path, path: &Path) -> Result<()> {
    if path == root || !path.starts_with(root) {
        return Err(TransboxError::Filesystem(format!(
            "Refusing to remove {} outside workspace root {}",
            path.display(),
            root.display()
        )));
    }
    remove_tree_secure(path)
}
