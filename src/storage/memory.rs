//! In-process backend
//!
//! Holds the blob in memory. Useful as a scratch store and in tests.

use std::sync::RwLock;

use crate::error::{VaultError, VaultResult};

use super::Backend;

/// Backend that keeps the blob in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<Option<Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty backend (reads return `NotFound`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-loaded with `bytes`
    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            data: RwLock::new(Some(bytes.into())),
        }
    }

    /// Current contents, if any
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.data.read().ok().and_then(|data| data.clone())
    }
}

impl Backend for MemoryBackend {
    fn read(&self) -> VaultResult<Vec<u8>> {
        let data = self
            .data
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        data.clone()
            .ok_or_else(|| VaultError::backend_not_found("memory"))
    }

    fn write(&self, bytes: &[u8]) -> VaultResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *data = Some(bytes.to_vec());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory store".to_string()
    }
}
