//! The live vault and its persistence
//!
//! - `VaultStore`: the in-memory credential list behind a reader-writer lock
//! - `VaultPersistence`: load/save/restore through a backend and the envelope

pub mod persistence;
pub mod store;

pub use persistence::{LoadOutcome, VaultPersistence};
pub use store::VaultStore;
