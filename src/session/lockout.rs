//! Lockout sentinel persistence
//!
//! The sentinel is a plain RFC 3339 timestamp marking when the lockout
//! ends. It lives on disk so a restart does not reset the cooldown.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use crate::error::{VaultError, VaultResult};
use crate::storage::write_bytes_atomic;

/// Where the lockout expiry is kept between runs
pub trait LockoutStore: Send + Sync {
    /// The stored expiry, if any
    fn load(&self) -> VaultResult<Option<DateTime<Utc>>>;

    /// Persist a new expiry
    fn store(&self, until: DateTime<Utc>) -> VaultResult<()>;

    /// Remove the sentinel
    fn clear(&self) -> VaultResult<()>;
}

/// Sentinel file on disk (`block.lock`)
#[derive(Debug, Clone)]
pub struct FileLockoutStore {
    path: PathBuf,
}

impl FileLockoutStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LockoutStore for FileLockoutStore {
    fn load(&self) -> VaultResult<Option<DateTime<Utc>>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VaultError::Io(format!(
                    "Failed to read lockout sentinel: {}",
                    e
                )))
            }
        };

        match DateTime::parse_from_rfc3339(contents.trim()) {
            Ok(until) => Ok(Some(until.with_timezone(&Utc))),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding unreadable lockout sentinel");
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn store(&self, until: DateTime<Utc>) -> VaultResult<()> {
        let stamp = until.to_rfc3339_opts(SecondsFormat::Secs, true);
        write_bytes_atomic(&self.path, stamp.as_bytes())
    }

    fn clear(&self) -> VaultResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VaultError::Io(format!(
                "Failed to remove lockout sentinel: {}",
                e
            ))),
        }
    }
}

/// Sentinel kept in memory; does not survive the process
#[derive(Debug, Default)]
pub struct MemoryLockoutStore {
    until: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryLockoutStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockoutStore for MemoryLockoutStore {
    fn load(&self) -> VaultResult<Option<DateTime<Utc>>> {
        self.until
            .lock()
            .map(|until| *until)
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    fn store(&self, until: DateTime<Utc>) -> VaultResult<()> {
        let mut slot = self
            .until
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock: {}", e)))?;
        *slot = Some(until);
        Ok(())
    }

    fn clear(&self) -> VaultResult<()> {
        let mut slot = self
            .until
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock: {}", e)))?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileLockoutStore::new(temp_dir.path().join("block.lock"));
        assert_eq!(store.load().unwrap(), None);

        let until = Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap();
        store.store(until).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert_eq!(contents, "2026-10-18T12:30:00Z");
        assert_eq!(store.load().unwrap(), Some(until));

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_accepts_offsets() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileLockoutStore::new(temp_dir.path().join("block.lock"));
        fs::write(store.path(), "2026-10-18T15:30:00+03:00\n").unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 12, 30, 0).unwrap();
        assert_eq!(store.load().unwrap(), Some(expected));
    }

    #[test]
    fn test_file_store_discards_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileLockoutStore::new(temp_dir.path().join("block.lock"));
        fs::write(store.path(), "not a timestamp").unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryLockoutStore::new();
        let until = Utc::now();
        store.store(until).unwrap();
        assert_eq!(store.load().unwrap(), Some(until));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
