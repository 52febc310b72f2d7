//! Path management for vaultkeeper
//!
//! Provides XDG-compliant path resolution for the vault, its verification
//! token, the lockout sentinel, backups and the audit log.
//!
//! ## Path Resolution Order
//!
//! 1. `VAULTKEEPER_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/vaultkeeper` or `~/.config/vaultkeeper`
//! 3. Windows: `%APPDATA%\vaultkeeper`

use std::path::PathBuf;

use crate::error::VaultError;

/// Manages all paths used by vaultkeeper
#[derive(Debug, Clone)]
pub struct VaultPaths {
    /// Base directory for all vaultkeeper data
    base_dir: PathBuf,
}

impl VaultPaths {
    /// Create a new VaultPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, VaultError> {
        let base_dir = if let Ok(custom) = std::env::var("VAULTKEEPER_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create VaultPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/vaultkeeper/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the backup directory (~/.config/vaultkeeper/backups/)
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the local encrypted vault
    pub fn vault_file(&self) -> PathBuf {
        self.base_dir.join("data.enc")
    }

    /// Get the path to the master-passphrase verification token
    pub fn token_file(&self) -> PathBuf {
        self.base_dir.join("token.enc")
    }

    /// Get the path to the lockout sentinel
    pub fn lockout_file(&self) -> PathBuf {
        self.base_dir.join("block.lock")
    }

    /// Ensure the base and backup directories exist
    pub fn ensure_directories(&self) -> Result<(), VaultError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| VaultError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| VaultError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, VaultError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg).join("vaultkeeper"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| VaultError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".config").join("vaultkeeper"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, VaultError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| VaultError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("vaultkeeper"))
}
