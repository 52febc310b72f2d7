//! User settings for vaultkeeper
//!
//! Manages user preferences including storage backend selection,
//! clipboard behaviour and backup retention. The key-derivation cost is not
//! a setting; see [`crate::crypto::key_derivation`].

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::error::VaultError;

/// Where the encrypted vault lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Local file (`data.enc` in the base directory)
    #[default]
    Local,
    /// Remote WebDAV/HTTP store
    Remote,
}

/// Storage backend settings
///
/// The remote password is never persisted; it is prompted per session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageSettings {
    #[serde(default)]
    pub kind: StorageKind,

    /// Full URL of the remote vault blob (e.g. `https://dav.example.com/vault.enc`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,

    /// Username for HTTP basic auth against the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_username: Option<String>,
}

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of most recent backups to keep
    pub keep_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self { keep_count: 20 }
    }
}

/// User settings for vaultkeeper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Storage backend selection
    #[serde(default)]
    pub storage: StorageSettings,

    /// Length of generated passwords when none is supplied
    #[serde(default = "default_password_length")]
    pub password_length: usize,

    /// Seconds before a copied secret is wiped from the clipboard
    #[serde(default = "default_clipboard_clear_secs")]
    pub clipboard_clear_secs: u64,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,
}

fn default_schema_version() -> u32 {
    1
}

fn default_password_length() -> usize {
    12
}

fn default_clipboard_clear_secs() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            storage: StorageSettings::default(),
            password_length: default_password_length(),
            clipboard_clear_secs: default_clipboard_clear_secs(),
            backup_retention: BackupRetention::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| VaultError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                VaultError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| VaultError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject settings the rest of the crate cannot honour
    pub fn validate(&self) -> Result<(), VaultError> {
        if !(8..=128).contains(&self.password_length) {
            return Err(VaultError::Config(format!(
                "password_length must be between 8 and 128, got {}",
                self.password_length
            )));
        }
        if self.clipboard_clear_secs == 0 {
            return Err(VaultError::Config(
                "clipboard_clear_secs must be at least 1".into(),
            ));
        }
        if self.storage.kind == StorageKind::Remote && self.storage.remote_url.is_none() {
            return Err(VaultError::Config(
                "remote storage selected but remote_url is not set".into(),
            ));
        }
        Ok(())
    }

    /// Clipboard clear delay as a std duration
    pub fn clipboard_clear_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.clipboard_clear_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.storage.kind, StorageKind::Local);
        assert_eq!(settings.password_length, 12);
        assert_eq!(settings.clipboard_clear_secs, 10);
        assert_eq!(settings.backup_retention.keep_count, 20);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.storage.kind = StorageKind::Remote;
        settings.storage.remote_url = Some("https://dav.example.com/vault.enc".into());
        settings.storage.remote_username = Some("alice".into());

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.storage.kind, StorageKind::Remote);
        assert_eq!(loaded.storage.remote_username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.password_length, 12);
    }

    #[test]
    fn test_key_derivation_in_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(
            paths.settings_file(),
            r#"{"key_derivation": {"memory_cost": 256, "time_cost": 1, "parallelism": 1}}"#,
        )
        .unwrap();

        let settings = Settings::load_or_create(&paths).unwrap();
        settings.save(&paths).unwrap();

        let written = std::fs::read_to_string(paths.settings_file()).unwrap();
        assert!(!written.contains("key_derivation"));
        assert!(!written.contains("time_cost"));
    }

    #[test]
    fn test_remote_without_url_is_rejected() {
        let mut settings = Settings::default();
        settings.storage.kind = StorageKind::Remote;
        assert!(matches!(settings.validate(), Err(VaultError::Config(_))));
    }

    #[test]
    fn test_password_length_bounds() {
        let mut settings = Settings::default();
        settings.password_length = 4;
        assert!(settings.validate().is_err());
        settings.password_length = 128;
        assert!(settings.validate().is_ok());
    }
}
