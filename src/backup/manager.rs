//! Backup manager for vaultkeeper
//!
//! Backups are envelope-encrypted snapshots of the serialized vault, one
//! file per backup, named with a sortable timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::strength::check_passphrase_strength;
use crate::config::settings::BackupRetention;
use crate::crypto::Envelope;
use crate::error::{VaultError, VaultResult};
use crate::storage::write_bytes_atomic;

const BACKUP_PREFIX: &str = "vault_";
const BACKUP_EXTENSION: &str = "enc";

/// Metadata about a backup
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: BackupRetention,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>, retention: BackupRetention) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            retention,
        }
    }

    /// Encrypt `snapshot` under `passphrase` into a new backup file
    ///
    /// The passphrase must pass the strength rules. Returns the path of the
    /// created file.
    pub fn create_backup(
        &self,
        snapshot: &[u8],
        envelope: &Envelope,
        passphrase: &str,
    ) -> VaultResult<PathBuf> {
        check_passphrase_strength(passphrase)?;

        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Utc::now();
        let filename = format!(
            "{}{}-{:03}.{}",
            BACKUP_PREFIX,
            now.format("%Y%m%d-%H%M%S"),
            now.timestamp_subsec_millis(),
            BACKUP_EXTENSION
        );
        let backup_path = self.backup_dir.join(&filename);

        let blob = envelope.encrypt(snapshot, passphrase.as_bytes())?;
        write_bytes_atomic(&backup_path, &blob)?;

        info!(path = %backup_path.display(), "backup created");
        Ok(backup_path)
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> VaultResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| VaultError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| VaultError::Io(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == BACKUP_EXTENSION) {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(backups)
    }

    /// Delete all but the newest `keep_count` backups
    pub fn enforce_retention(&self) -> VaultResult<Vec<PathBuf>> {
        let mut deleted = Vec::new();

        for backup in self
            .list_backups()?
            .into_iter()
            .skip(self.retention.keep_count as usize)
        {
            fs::remove_file(&backup.path)
                .map_err(|e| VaultError::Io(format!("Failed to delete old backup: {}", e)))?;
            debug!(path = %backup.path.display(), "old backup removed");
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Create a backup and then enforce retention policy
    pub fn create_backup_with_retention(
        &self,
        snapshot: &[u8],
        envelope: &Envelope,
        passphrase: &str,
    ) -> VaultResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup(snapshot, envelope, passphrase)?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Get the most recent backup
    pub fn get_latest_backup(&self) -> VaultResult<Option<BackupInfo>> {
        let backups = self.list_backups()?;
        Ok(backups.into_iter().next())
    }
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();

    // vault_YYYYMMDD-HHMMSS-mmm.enc
    let date_part = filename
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_EXTENSION)?
        .strip_suffix('.')?;
    let created_at = parse_backup_timestamp(date_part)?;

    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
    })
}

/// Parse `YYYYMMDD-HHMMSS` with an optional `-mmm` millisecond suffix
///
/// Anything that is not ASCII digits in those positions is rejected.
fn parse_backup_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = date_str.split('-').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    if !parts
        .iter()
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    if parts[0].len() != 8 || parts[1].len() != 6 {
        return None;
    }

    let naive =
        NaiveDateTime::parse_from_str(&format!("{}-{}", parts[0], parts[1]), "%Y%m%d-%H%M%S")
            .ok()?;
    let millis: u32 = match parts.get(2) {
        Some(ms) if ms.len() <= 3 => ms.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };
    let naive = naive.with_nanosecond(millis * 1_000_000)?;

    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}
