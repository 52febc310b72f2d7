//! Cryptographic functions for vaultkeeper
//!
//! Provides the AES-256-GCM envelope with Argon2id key derivation used for
//! the vault, the verification token and backups.

pub mod envelope;
pub mod key_derivation;
pub mod secure_memory;

pub use envelope::Envelope;
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use secure_memory::SecureString;
