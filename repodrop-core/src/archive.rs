//! Downloaded archive handle and extraction workspace
//!
//! Both types own a temporary filesystem resource that is removed when the
//! value is dropped, so every early return cleans up after itself.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use zip::ZipArchive;

use crate::fs::create_dir_all;
use crate::{Error, Result};

/// Temporary file holding downloaded ZIP bytes
#[derive(Debug)]
pub struct ArchiveHandle {
    file: NamedTempFile,
    written: u64,
}

impl ArchiveHandle {
    /// Create an empty archive file in `temp_dir`, or the platform temp
    /// directory when `None`
    pub fn create(temp_dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("repodrop-").suffix(".zip");

        let file = match temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| Error::DownloadFailed(format!("Failed to create temporary file: {}", e)))?;

        tracing::debug!(path = %file.path().display(), "Created archive file");
        Ok(Self { file, written: 0 })
    }

    /// Path of the temporary file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of bytes written so far
    pub fn len(&self) -> u64 {
        self.written
    }

    /// Whether nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Append a chunk of the response body
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).map_err(|e| {
            Error::DownloadFailed(format!(
                "Failed to write {}: {}",
                self.file.path().display(),
                e
            ))
        })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes and return the total size
    pub fn finish(&mut self) -> Result<u64> {
        self.file.flush().map_err(|e| {
            Error::DownloadFailed(format!(
                "Failed to flush {}: {}",
                self.file.path().display(),
                e
            ))
        })?;
        Ok(self.written)
    }
}

/// Temporary directory the archive is unpacked into
#[derive(Debug)]
pub struct ExtractionWorkspace {
    dir: TempDir,
    entries: usize,
}

impl ExtractionWorkspace {
    /// Unpack `archive` into a fresh workspace under `temp_dir`
    ///
    /// Entries keep their relative paths. Entries that would land outside the
    /// workspace are rejected.
    pub fn extract(archive: &ArchiveHandle, temp_dir: Option<&Path>) -> Result<Self> {
        let file = File::open(archive.path()).map_err(|e| {
            Error::CorruptArchive(format!("Failed to open downloaded archive: {}", e))
        })?;
        let mut zip = ZipArchive::new(file).map_err(|e| {
            Error::CorruptArchive(format!("Failed to open downloaded ZIP: {}", e))
        })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("repodrop-extract-");
        let dir = match temp_dir {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            Error::CorruptArchive(format!("Failed to create extraction directory: {}", e))
        })?;

        tracing::debug!(
            workspace = %dir.path().display(),
            entries = zip.len(),
            "Extracting archive"
        );

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(|e| {
                Error::CorruptArchive(format!("Failed to read entry {}: {}", index, e))
            })?;

            let rel_path = entry.enclosed_name().ok_or_else(|| {
                Error::CorruptArchive(format!("Entry escapes archive root: {}", entry.name()))
            })?;
            let target = dir.path().join(&rel_path);

            if entry.is_dir() {
                create_dir_all(&target).map_err(|e| extract_error(&rel_path, e))?;
                continue;
            }

            if let Some(parent) = target.parent() {
                create_dir_all(parent).map_err(|e| extract_error(&rel_path, e))?;
            }
            let mut out = File::create(&target).map_err(|e| extract_error(&rel_path, e))?;
            io::copy(&mut entry, &mut out).map_err(|e| extract_error(&rel_path, e))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let mode = file_mode(entry.unix_mode());
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))
                    .map_err(|e| extract_error(&rel_path, e))?;
            }
        }

        Ok(Self {
            dir,
            entries: zip.len(),
        })
    }

    /// Path of the workspace directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Number of entries the archive contained
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// The archive's root folder: the first child of the workspace
    ///
    /// GitHub archives hold a single `<repo>-<branch>` folder.
    pub fn root(&self) -> Result<PathBuf> {
        let mut children = fs::read_dir(self.dir.path()).map_err(|e| {
            Error::EmptyArchive(format!("Failed to list extracted archive: {}", e))
        })?;

        let first = match children.next() {
            Some(entry) => entry.map_err(|e| {
                Error::EmptyArchive(format!("Failed to list extracted archive: {}", e))
            })?,
            None => {
                return Err(Error::EmptyArchive(
                    "Archive contains no root folder".to_string(),
                ))
            }
        };

        let path = first.path();
        if !path.is_dir() {
            return Err(Error::EmptyArchive(format!(
                "Archive has no root folder, found file {}",
                first.file_name().to_string_lossy()
            )));
        }

        Ok(path)
    }

    /// Remove the workspace, logging instead of failing if removal fails
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            tracing::warn!(workspace = %path.display(), "Failed to remove extraction workspace: {}", e);
        }
    }
}

/// Permissions for an extracted file
///
/// Only regular-file entries (or entries with no recorded file type) keep
/// their permission bits. Symlinks and other special entries are written as
/// plain files and get 0644. Group and other never get write access; the
/// owner always keeps read/write.
#[cfg(unix)]
fn file_mode(unix_mode: Option<u32>) -> u32 {
    const S_IFMT: u32 = 0o170000;
    const S_IFREG: u32 = 0o100000;

    match unix_mode {
        Some(mode) if matches!(mode & S_IFMT, 0 | S_IFREG) => (mode & 0o755) | 0o600,
        _ => 0o644,
    }
}

fn extract_error(rel_path: &Path, e: io::Error) -> Error {
    Error::CorruptArchive(format!("Failed to extract {}: {}", rel_path.display(), e))
}
