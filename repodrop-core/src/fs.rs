//! Destination directory reset and tree copy

use std::fs;
use std::io;
use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::{Error, Result};

/// Counts reported by [`copy_tree`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Directories created or confirmed under the destination
    pub dirs: usize,
    /// Files copied
    pub files: usize,
    /// Total bytes copied
    pub bytes: u64,
}

/// Delete `dest` completely and recreate it as an empty directory
///
/// Directory contents are removed before the directory itself. Symlinks are
/// removed as entries and never followed. Parent directories are created as
/// needed.
pub fn reset_destination(dest: &Path) -> Result<()> {
    ensure_resettable(dest)?;

    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => {
            tracing::debug!(dest = %dest.display(), "Removing existing destination");
            fs::remove_dir_all(dest).map_err(|e| {
                Error::DestinationError(format!("Failed to remove {}: {}", dest.display(), e))
            })?;
        }
        Ok(_) => {
            // A file or symlink sitting where the directory should be
            fs::remove_file(dest).map_err(|e| {
                Error::DestinationError(format!("Failed to remove {}: {}", dest.display(), e))
            })?;
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::DestinationError(format!(
                "Failed to inspect {}: {}",
                dest.display(),
                e
            )));
        }
    }

    create_dir_all(dest).map_err(|e| {
        Error::DestinationError(format!("Failed to create {}: {}", dest.display(), e))
    })
}

/// Refuse destinations whose removal could never be intended
fn ensure_resettable(dest: &Path) -> Result<()> {
    if dest.as_os_str().is_empty() {
        return Err(Error::DestinationError("Destination path is empty".to_string()));
    }

    let only_root = dest
        .components()
        .all(|c| matches!(c, Component::RootDir | Component::Prefix(_) | Component::CurDir));
    if only_root {
        return Err(Error::DestinationError(format!(
            "Refusing to replace {}",
            dest.display()
        )));
    }

    if dest.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::DestinationError(format!(
            "Refusing to replace {}: path contains '..'",
            dest.display()
        )));
    }

    Ok(())
}

/// Copy the contents of `root` into `dest`
///
/// The walk is pre-order, so each directory exists before its children are
/// copied. `root` itself is not recreated; its children land directly under
/// `dest`. Existing files are overwritten.
pub fn copy_tree(root: &Path, dest: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| {
            Error::CopyFailed(format!("Failed to read directory entry: {}", e))
        })?;

        let rel_path = entry.path().strip_prefix(root).map_err(|_| {
            Error::CopyFailed(format!(
                "{} is outside {}",
                entry.path().display(),
                root.display()
            ))
        })?;
        let target = dest.join(rel_path);

        if entry.file_type().is_dir() {
            if !target.is_dir() {
                create_dir_all(&target).map_err(|e| {
                    Error::CopyFailed(format!("Failed to create {}: {}", target.display(), e))
                })?;
            }
            stats.dirs += 1;
        } else {
            let bytes = fs::copy(entry.path(), &target).map_err(|e| {
                Error::CopyFailed(format!(
                    "Failed to copy {} to {}: {}",
                    rel_path.display(),
                    target.display(),
                    e
                ))
            })?;
            stats.files += 1;
            stats.bytes += bytes;
        }
    }

    Ok(stats)
}

/// `create_dir_all` with 0755 permissions on Unix
pub(crate) fn create_dir_all(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}
