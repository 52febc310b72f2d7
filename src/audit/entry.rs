//! Audit entry data structures
//!
//! Entries identify what changed by locator, path or name. Secrets never
//! appear in an entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Credential;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Delete,
    Restore,
    Backup,
    Lockout,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Restore => write!(f, "RESTORE"),
            Operation::Backup => write!(f, "BACKUP"),
            Operation::Lockout => write!(f, "LOCKOUT"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Credential,
    Vault,
    Session,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Credential => write!(f, "Credential"),
            EntityType::Vault => write!(f, "Vault"),
            EntityType::Session => write!(f, "Session"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    /// Locator, backup path or other identifier of the affected entity
    pub entity_id: String,

    /// Human-readable name, when there is one
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub entity_name: Option<String>,

    /// Short description of the outcome
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub summary: Option<String>,
}

impl AuditEntry {
    pub fn new(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            entity_name,
            summary,
        }
    }

    /// A credential was added
    pub fn credential_created(credential: &Credential) -> Self {
        Self::new(
            Operation::Create,
            EntityType::Credential,
            credential.url.clone(),
            Some(credential.name.clone()),
            Some(format!("login {}", credential.login)),
        )
    }

    /// Credentials matching `fragment` were removed
    pub fn credentials_deleted(fragment: &str, removed: usize) -> Self {
        Self::new(
            Operation::Delete,
            EntityType::Credential,
            fragment,
            None,
            Some(format!("{} removed", removed)),
        )
    }

    /// The vault was replaced from a backup
    pub fn vault_restored(source: impl Into<String>, entries: usize) -> Self {
        Self::new(
            Operation::Restore,
            EntityType::Vault,
            source,
            None,
            Some(format!("{} entries restored", entries)),
        )
    }

    /// A backup file was written
    pub fn backup_created(path: impl Into<String>, pruned: usize) -> Self {
        let summary = (pruned > 0).then(|| format!("{} old backups pruned", pruned));
        Self::new(Operation::Backup, EntityType::Vault, path, None, summary)
    }

    /// The session guard locked out after repeated failures
    pub fn lockout(until: DateTime<Utc>) -> Self {
        Self::new(
            Operation::Lockout,
            EntityType::Session,
            "master passphrase",
            None,
            Some(format!("blocked until {}", until.format("%Y-%m-%d %H:%M:%S UTC"))),
        )
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(summary) = &self.summary {
            output.push_str(&format!(": {}", summary));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Restore.to_string(), "RESTORE");
        assert_eq!(Operation::Lockout.to_string(), "LOCKOUT");
    }

    #[test]
    fn test_credential_entry_omits_secret() {
        let credential =
            Credential::new("GitHub", "octocat", "hunter2hunter2", "https://github.com").unwrap();
        let entry = AuditEntry::credential_created(&credential);

        assert_eq!(entry.operation, Operation::Create);
        assert_eq!(entry.entity_id, "https://github.com");
        assert_eq!(entry.entity_name.as_deref(), Some("GitHub"));

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_serialization() {
        let entry = AuditEntry::credentials_deleted("example.com", 2);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"operation\":\"delete\""));
        assert!(!json.contains("entity_name"));

        let deserialized: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entry);
    }

    #[test]
    fn test_backup_summary_only_when_pruned() {
        assert!(AuditEntry::backup_created("/tmp/b.enc", 0).summary.is_none());
        assert_eq!(
            AuditEntry::backup_created("/tmp/b.enc", 3).summary.as_deref(),
            Some("3 old backups pruned")
        );
    }

    #[test]
    fn test_human_readable_format() {
        let entry = AuditEntry::vault_restored("/backups/vault_1.enc", 4);
        let formatted = entry.format_human_readable();
        assert!(formatted.contains("RESTORE Vault /backups/vault_1.enc"));
        assert!(formatted.ends_with(": 4 entries restored"));
    }
}
