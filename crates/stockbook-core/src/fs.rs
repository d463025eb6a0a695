//! Filesystem utilities for atomic operations.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Result, StoreError};

/// Build a unique sibling path for staging a replacement of `path`.
///
/// The temp file lives in the same directory so the final rename never
/// crosses a filesystem boundary.
pub fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Persistence(format!("Invalid path: {}", path.display())))?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| StoreError::Persistence(format!("System time error: {}", e)))?
        .as_nanos();
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StoreError::Persistence(format!("Invalid filename: {}", path.display())))?;
    Ok(parent.join(format!("{}.{}.tmp", filename, nanos)))
}

/// Create a fresh temp file; fails if one with the same name already exists.
pub fn create_temp(temp_path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .map_err(|e| StoreError::Persistence(format!("Temp file create failed: {}", e)))
}

/// Rename `temp_path` over `destination` in one step.
///
/// The destination is never removed. On failure the temp file is removed and
/// the destination keeps its previous contents.
pub fn rename_into_place(temp_path: &Path, destination: &Path) -> Result<()> {
    fs::rename(temp_path, destination).map_err(|e| {
        let _ = fs::remove_file(temp_path);
        StoreError::Persistence(format!(
            "Atomic rename onto {} failed: {}",
            destination.display(),
            e
        ))
    })
}

/// Replace `path` with `data` through a synced temp file and a single rename.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path)?;
    let mut file = create_temp(&temp_path)?;
    let written = file
        .write_all(data)
        .and_then(|_| file.sync_all())
        .map_err(|e| StoreError::Persistence(format!("Temp file write failed: {}", e)));
    drop(file);
    if let Err(err) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }

    rename_into_place(&temp_path, path)
}
