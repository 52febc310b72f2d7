//! Local file backend with atomic writes
//!
//! Writes go to a temp file in the same directory, are synced, then renamed
//! over the target, so a crash leaves either the old blob or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{VaultError, VaultResult};

use super::Backend;

/// Vault blob stored in a single local file
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for FileBackend {
    fn read(&self) -> VaultResult<Vec<u8>> {
        read_bytes(&self.path)
    }

    fn write(&self, data: &[u8]) -> VaultResult<()> {
        write_bytes_atomic(&self.path, data)?;
        debug!(path = %self.path.display(), bytes = data.len(), "wrote vault file");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local file {}", self.path.display())
    }
}

/// Read a whole file, mapping a missing file to `NotFound`
pub fn read_bytes(path: &Path) -> VaultResult<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(VaultError::backend_not_found(path.display().to_string()))
        }
        Err(e) => Err(VaultError::Backend(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write bytes to a file atomically (write to temp, then rename)
///
/// The file is created owner-read/write only on Unix.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> VaultResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            VaultError::Backend(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path);

    let mut file = create_private(&temp_path)
        .map_err(|e| VaultError::Backend(format!("Failed to create temp file: {}", e)))?;

    file.write_all(data)
        .and_then(|_| file.flush())
        .and_then(|_| file.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            VaultError::Backend(format!("Failed to write {}: {}", path.display(), e))
        })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        VaultError::Backend(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn create_private(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_private(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
