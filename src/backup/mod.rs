//! Encrypted vault backups
//!
//! `BackupManager` writes envelope-encrypted snapshots under the backup
//! directory and prunes old ones by count. Restoring a backup goes through
//! [`VaultPersistence::restore_from_path`](crate::vault::VaultPersistence::restore_from_path),
//! which replaces the live vault and saves it.
//!
//! Backups are protected by their own passphrase, which must satisfy the
//! rules in [`strength`].

mod manager;
pub mod strength;

pub use manager::{BackupInfo, BackupManager};
pub use strength::{check_passphrase_strength, WeakPassphrase};
