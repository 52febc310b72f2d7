//! Configuration module for vaultkeeper
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence
//! - Storage backend selection

pub mod paths;
pub mod settings;

pub use paths::VaultPaths;
pub use settings::{Settings, StorageKind};
