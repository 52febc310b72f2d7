//! vaultkeeper - terminal password vault
//!
//! Credentials (name, login, password, URL) are kept in a vault that is
//! sealed with a passphrase-derived key and stored in a local file or on a
//! remote HTTP server.
//!
//! # Architecture
//!
//! - `crypto`: key derivation and the `salt || nonce || ciphertext` envelope
//! - `models`: credentials and the vault document
//! - `storage`: byte-blob backends (file, HTTP, memory)
//! - `vault`: the locked in-memory store and load/save/restore
//! - `session`: master passphrase verification and lockout
//! - `clipboard`: copy with timed auto-clear
//! - `backup`: encrypted snapshots with retention
//! - `audit`: append-only audit log
//! - `config`: paths and settings
//! - `cli` and `display`: the interactive menu
//!
//! # Example
//!
//! ```rust,ignore
//! use vaultkeeper::crypto::Envelope;
//! use vaultkeeper::storage::FileBackend;
//! use vaultkeeper::vault::VaultPersistence;
//!
//! let backend = Box::new(FileBackend::new("data.enc"));
//! let (vault, _) = VaultPersistence::load(backend, Envelope::default(), b"passphrase")?;
//! println!("{} credentials", vault.store().len()?);
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod vault;

pub use error::{VaultError, VaultResult};
