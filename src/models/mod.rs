//! Core data models for vaultkeeper
//!
//! This module contains the data structures that make up the vault:
//! individual credentials and the vault snapshot that holds them.

pub mod credential;
pub mod vault;

pub use credential::{
    generate_password, mask_secret, Credential, CredentialValidationError,
    DEFAULT_PASSWORD_LENGTH, PASSWORD_ALPHABET,
};
pub use vault::{Vault, VERIFICATION_MARKER};
