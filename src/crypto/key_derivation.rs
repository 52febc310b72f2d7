//! Key derivation using Argon2id
//!
//! Derives envelope keys from passphrases using Argon2id, a memory-hard
//! iterated KDF. Each derivation costs tens of milliseconds at the default
//! parameters, which is the main brake on offline guessing of a stolen blob.
//!
//! Envelopes do not record their cost, so the cost is fixed in code and not
//! user-configurable: changing it would make every stored vault, token and
//! backup undecryptable.

use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{VaultError, VaultResult};

/// Length of the derived key in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Debug builds read this variable to switch to [`KeyDerivationParams::fast`]
pub const FAST_KDF_ENV: &str = "VAULTKEEPER_FAST_KDF";

/// Cost parameters for key derivation
///
/// The salt is not part of these parameters: every envelope carries its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism degree (default: 4)
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KeyDerivationParams {
    /// Minimal cost for test runs
    pub const fn fast() -> Self {
        Self {
            memory_cost: 256,
            time_cost: 1,
            parallelism: 1,
        }
    }

    /// Cost used by the binary
    ///
    /// Always the default in release builds. Debug builds switch to
    /// [`KeyDerivationParams::fast`] when `VAULTKEEPER_FAST_KDF=1`, which the
    /// end-to-end tests rely on.
    pub fn runtime() -> Self {
        if cfg!(debug_assertions)
            && std::env::var(FAST_KDF_ENV).map(|v| v == "1").unwrap_or(false)
        {
            return Self::fast();
        }
        Self::default()
    }

    fn to_argon2(self) -> VaultResult<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| VaultError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// A derived encryption key, wiped from memory on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

/// Derive an encryption key from a passphrase and a raw salt
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8],
    params: &KeyDerivationParams,
) -> VaultResult<DerivedKey> {
    let argon2 = params.to_argon2()?;

    let mut key = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| VaultError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(DerivedKey { key })
}
