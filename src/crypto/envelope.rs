//! Passphrase envelope: Argon2id + AES-256-GCM
//!
//! Wire format: `salt (32) || nonce (12) || ciphertext+tag`.
//! A fresh salt is drawn for every call, so every envelope is sealed under
//! its own derived key and a (key, nonce) pair can never repeat.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};

use crate::error::{VaultError, VaultResult};

use super::key_derivation::{derive_key, KeyDerivationParams};

/// Size of the per-envelope salt in bytes
pub const SALT_SIZE: usize = 32;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Bytes preceding the ciphertext
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE;

/// Seals and opens passphrase-protected byte payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct Envelope {
    params: KeyDerivationParams,
}

impl Envelope {
    /// Create an envelope using the given key-derivation cost
    pub fn new(params: KeyDerivationParams) -> Self {
        Self { params }
    }

    /// Encrypt `plaintext` under a key derived from `passphrase`
    pub fn encrypt(&self, plaintext: &[u8], passphrase: &[u8]) -> VaultResult<Vec<u8>> {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);

        let key = derive_key(passphrase, &salt, &self.params)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| VaultError::Encryption(format!("Failed to create cipher: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| VaultError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut blob = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt an envelope produced by [`Envelope::encrypt`]
    ///
    /// A wrong passphrase and a tampered blob both surface as
    /// [`VaultError::AuthenticationFailure`].
    pub fn decrypt(&self, blob: &[u8], passphrase: &[u8]) -> VaultResult<Vec<u8>> {
        if blob.len() < HEADER_SIZE {
            return Err(VaultError::MalformedInput(format!(
                "envelope is {} bytes, expected at least {}",
                blob.len(),
                HEADER_SIZE
            )));
        }

        let (salt, rest) = blob.split_at(SALT_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let key = derive_key(passphrase, salt, &self.params)?;
        let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| VaultError::Encryption(format!("Failed to create cipher: {}", e)))?;

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::AuthenticationFailure)
    }
}
