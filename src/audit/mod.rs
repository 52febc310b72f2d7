//! Audit log for vaultkeeper
//!
//! Records credential creation and deletion, restores, backups and lockouts
//! in an append-only JSONL file. Entries carry identifiers only, never
//! passphrases or stored secrets.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
