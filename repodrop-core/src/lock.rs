//! Exclusive lock serializing deploys to one destination
//!
//! The lock file lives next to the destination, not inside it, since the
//! destination itself is deleted during a deploy.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::fs::create_dir_all;
use crate::{Error, Result};

/// Held advisory lock on a destination path
///
/// The lock is released when the value is dropped.
#[derive(Debug)]
pub struct DestinationLock {
    _file: File,
    path: PathBuf,
}

impl DestinationLock {
    /// Block until the lock for `dest` is available
    pub fn acquire(dest: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(dest)?;
        tracing::debug!(lock = %path.display(), "Waiting for destination lock");
        file.lock_exclusive().map_err(|e| {
            Error::DestinationError(format!("Failed to lock {}: {}", path.display(), e))
        })?;
        Ok(Self { _file: file, path })
    }

    /// Take the lock for `dest`, failing if another deploy holds it
    pub fn try_acquire(dest: &Path) -> Result<Self> {
        let (file, path) = open_lock_file(dest)?;
        file.try_lock_exclusive().map_err(|_| {
            Error::DestinationError(format!(
                "Another deploy to {} is in progress (lock: {})",
                dest.display(),
                path.display()
            ))
        })?;
        Ok(Self { _file: file, path })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lock file path for a destination: `.<name>.repodrop.lock` beside it
pub fn lock_path(dest: &Path) -> Result<PathBuf> {
    let name = dest.file_name().ok_or_else(|| {
        Error::DestinationError(format!("Cannot derive a lock file for {}", dest.display()))
    })?;
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!(".{}.repodrop.lock", name.to_string_lossy())))
}

fn open_lock_file(dest: &Path) -> Result<(File, PathBuf)> {
    let path = lock_path(dest)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| {
                Error::DestinationError(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|e| {
            Error::DestinationError(format!("Failed to open lock file {}: {}", path.display(), e))
        })?;

    Ok((file, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_sibling() {
        let path = lock_path(Path::new("/srv/www/bot")).unwrap();
        assert_eq!(path, PathBuf::from("/srv/www/.bot.repodrop.lock"));
    }

    #[test]
    fn test_lock_path_root_rejected() {
        assert!(matches!(
            lock_path(Path::new("/")),
            Err(Error::DestinationError(_))
        ));
    }

    #[test]
    fn test_try_acquire_conflict() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("site");

        let held = DestinationLock::try_acquire(&dest).unwrap();
        assert!(held.path().exists());

        let err = DestinationLock::try_acquire(&dest).unwrap_err();
        assert!(matches!(err, Error::DestinationError(_)));

        drop(held);
        assert!(DestinationLock::try_acquire(&dest).is_ok());
    }

    #[test]
    fn test_locks_are_per_destination() {
        let tmp = TempDir::new().unwrap();
        let _a = DestinationLock::acquire(&tmp.path().join("a")).unwrap();
        let _b = DestinationLock::try_acquire(&tmp.path().join("b")).unwrap();
    }
}
