//! In-memory vault with reader-writer locking
//!
//! Readers (`search`, `serialize`) share the lock; every mutation takes it
//! exclusively, so no reader ever sees a half-applied change.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use crate::error::{VaultError, VaultResult};
use crate::models::{Credential, Vault, VERIFICATION_MARKER};

/// The live vault shared between the session and the persistence layer
#[derive(Debug, Default)]
pub struct VaultStore {
    data: RwLock<Vault>,
}

impl VaultStore {
    /// Wrap a loaded vault
    pub fn new(vault: Vault) -> Self {
        Self {
            data: RwLock::new(vault),
        }
    }

    fn read(&self) -> VaultResult<RwLockReadGuard<'_, Vault>> {
        self.data
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> VaultResult<RwLockWriteGuard<'_, Vault>> {
        self.data
            .write()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Append a credential
    pub fn add(&self, credential: Credential) -> VaultResult<()> {
        let mut data = self.write()?;
        data.accounts.push(credential);
        data.updated_at = Utc::now();
        Ok(())
    }

    /// Remove every credential whose URL contains `fragment` (case-insensitive)
    ///
    /// An empty fragment matches, and removes, every credential.
    pub fn delete_by_locator(&self, fragment: &str) -> VaultResult<usize> {
        let needle = fragment.to_lowercase();
        let mut data = self.write()?;

        let before = data.accounts.len();
        data.accounts
            .retain(|c| !c.url.to_lowercase().contains(&needle));
        let removed = before - data.accounts.len();

        if removed > 0 {
            data.updated_at = Utc::now();
        }
        Ok(removed)
    }

    /// Credentials whose name, login or URL contain `query` (case-insensitive)
    pub fn search(&self, query: &str) -> VaultResult<Vec<Credential>> {
        let needle = query.to_lowercase();
        let data = self.read()?;

        Ok(data
            .accounts
            .iter()
            .filter(|c| c.matches(&needle))
            .cloned()
            .collect())
    }

    /// Pretty JSON encoding of the whole vault
    pub fn serialize(&self) -> VaultResult<Vec<u8>> {
        let data = self.read()?;
        serde_json::to_vec_pretty(&*data)
            .map_err(|e| VaultError::Json(format!("Failed to serialize vault: {}", e)))
    }

    /// Swap in the entries of `replacement`, stamping the vault as verified
    pub fn replace(&self, replacement: Vault) -> VaultResult<()> {
        let mut data = self.write()?;
        data.accounts = replacement.accounts;
        data.updated_at = Utc::now();
        data.verification = VERIFICATION_MARKER.to_string();
        Ok(())
    }

    /// Stamp the vault as verified
    pub fn mark_verified(&self) -> VaultResult<()> {
        let mut data = self.write()?;
        data.verification = VERIFICATION_MARKER.to_string();
        Ok(())
    }

    /// Clone of the current vault
    pub fn snapshot(&self) -> VaultResult<Vault> {
        Ok(self.read()?.clone())
    }

    /// Number of stored credentials
    pub fn len(&self) -> VaultResult<usize> {
        Ok(self.read()?.accounts.len())
    }

    /// Whether the vault holds no credentials
    pub fn is_empty(&self) -> VaultResult<bool> {
        Ok(self.read()?.accounts.is_empty())
    }
}
