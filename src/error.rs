//! Custom error types for vaultkeeper
//!
//! This module defines the error hierarchy for the vault using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for vaultkeeper operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// No stored payload exists for the requested entity
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Wrong passphrase or tampered ciphertext; the two are indistinguishable
    #[error("Authentication failed: wrong passphrase or corrupted data")]
    AuthenticationFailure,

    /// Payload is too short or structurally invalid
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Too many failed attempts; gated operations are refused until expiry
    #[error("Access blocked for another {}", format_remaining(.remaining))]
    Blocked { remaining: chrono::Duration },

    /// Storage backend I/O or network failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// Validation errors for credential entries and user input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Key derivation or cipher setup errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Clipboard access errors
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// In-memory storage errors (lock poisoning and the like)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Interactive input reached end of file
    #[error("Input closed")]
    InputClosed,
}

impl VaultError {
    /// Create a "not found" error for a backend payload
    pub fn backend_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Vault data",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for a backup file
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authentication failure
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailure)
    }

    /// Check if the lockout window is active
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    /// Check if interactive input has ended
    pub fn is_input_closed(&self) -> bool {
        matches!(self, Self::InputClosed)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the caller may reasonably try the same action again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::AuthenticationFailure | Self::Validation(_) | Self::Clipboard(_)
        )
    }
}

/// Render a lockout duration as whole minutes, rounded up
fn format_remaining(remaining: &chrono::Duration) -> String {
    let seconds = remaining.num_seconds().max(0);
    let minutes = (seconds + 59) / 60;
    if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", minutes)
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for vaultkeeper operations
pub type VaultResult<T> = Result<T, VaultError>;
