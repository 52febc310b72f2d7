//! Storage backends for vaultkeeper
//!
//! A backend stores one opaque blob. It knows nothing about encryption or
//! the vault's structure; the persistence layer hands it envelope bytes.

pub mod file;
pub mod http;
pub mod memory;

pub use file::{read_bytes, write_bytes_atomic, FileBackend};
pub use http::HttpBackend;
pub use memory::MemoryBackend;

use std::sync::Arc;

use crate::error::VaultResult;

/// Opaque byte-blob storage
pub trait Backend: Send + Sync {
    /// Fetch the stored blob; `VaultError::NotFound` if nothing was ever written
    fn read(&self) -> VaultResult<Vec<u8>>;

    /// Replace the stored blob
    fn write(&self, data: &[u8]) -> VaultResult<()>;

    /// Human-readable location for messages and logs
    fn describe(&self) -> String;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn read(&self) -> VaultResult<Vec<u8>> {
        (**self).read()
    }

    fn write(&self, data: &[u8]) -> VaultResult<()> {
        (**self).write(data)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn read(&self) -> VaultResult<Vec<u8>> {
        (**self).read()
    }

    fn write(&self, data: &[u8]) -> VaultResult<()> {
        (**self).write(data)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
