//! Vault model
//!
//! The serializable snapshot of every stored credential. This is the
//! plaintext that goes inside the envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::credential::Credential;

/// Marker written once a vault has been loaded or restored successfully
pub const VERIFICATION_MARKER: &str = "VERIFIED";

/// Plaintext vault contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    /// Credentials in insertion order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub accounts: Vec<Credential>,

    /// When the vault was last modified
    #[serde(default)]
    pub updated_at: DateTime<Utc>,

    /// Opaque verification marker
    #[serde(default)]
    pub verification: String,
}

impl Default for Vault {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            updated_at: Utc::now(),
            verification: String::new(),
        }
    }
}

impl Vault {
    /// Create an empty vault stamped with the current time
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a successful load or restore has stamped this vault
    pub fn is_verified(&self) -> bool {
        self.verification == VERIFICATION_MARKER
    }

    /// Parse a plaintext vault
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

// Older writers emit `"accounts": null` once the last entry is deleted
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Credential>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Credential>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_vault_is_empty() {
        let vault = Vault::new();
        assert!(vault.accounts.is_empty());
        assert!(!vault.is_verified());
    }

    #[test]
    fn test_parse_null_accounts() {
        let json = br#"{"accounts":null,"updatedAt":"2025-04-05T10:00:00Z","verification":""}"#;
        let vault = Vault::from_slice(json).unwrap();
        assert!(vault.accounts.is_empty());
    }

    #[test]
    fn test_parse_nanosecond_timestamps() {
        let json = br#"{
            "accounts": [{
                "name": "Mail",
                "login": "me",
                "password": "pw",
                "url": "https://mail.example.com",
                "createdAt": "2025-04-05T10:00:00.123456789+03:00",
                "updatedAt": "2025-04-05T10:00:00.123456789+03:00"
            }],
            "updatedAt": "2025-04-05T10:00:00.5+03:00",
            "verification": "VERIFIED"
        }"#;
        let vault = Vault::from_slice(json).unwrap();
        assert_eq!(vault.accounts.len(), 1);
        assert!(vault.is_verified());
    }

    #[test]
    fn test_field_order_is_stable() {
        let vault = Vault::new();
        let json = serde_json::to_string(&vault).unwrap();
        let accounts = json.find("\"accounts\"").unwrap();
        let updated = json.find("\"updatedAt\"").unwrap();
        let verification = json.find("\"verification\"").unwrap();
        assert!(accounts < updated && updated < verification);
    }

    #[test]
    fn test_garbage_does_not_parse() {
        assert!(Vault::from_slice(b"\x00\x01not json").is_err());
    }
}
