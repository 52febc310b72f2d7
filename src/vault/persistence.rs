//! Loading, saving and restoring the vault through a backend
//!
//! Loading runs an explicit attempt pipeline: decrypt with the passphrase,
//! else accept the raw bytes as a legacy unencrypted vault, else give up.
//! Saving serializes under the store's read lock, seals the bytes and only
//! then touches the backend.

use std::path::Path;

use tracing::{info, warn};

use crate::crypto::Envelope;
use crate::error::{VaultError, VaultResult};
use crate::models::Vault;
use crate::storage::{read_bytes, Backend};

use super::store::VaultStore;

/// How the live vault came into being
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Backend had no payload; a new empty vault was created
    Fresh,
    /// Payload decrypted under the supplied passphrase
    Decrypted,
    /// Payload was an unencrypted vault from before encryption existed
    LegacyPlaintext,
}

/// Result of trying to read a stored payload
enum Attempt {
    Decrypted(Vault),
    LegacyPlaintext(Vault),
    Unreadable(VaultError),
}

/// Owns the live vault and the backend it persists to
pub struct VaultPersistence {
    backend: Box<dyn Backend>,
    envelope: Envelope,
    store: VaultStore,
}

impl VaultPersistence {
    /// Load the vault from `backend`
    ///
    /// An absent or empty payload yields an empty vault. A payload that
    /// neither decrypts nor parses as a legacy vault is an error the caller
    /// must treat as fatal.
    pub fn load(
        backend: Box<dyn Backend>,
        envelope: Envelope,
        passphrase: &[u8],
    ) -> VaultResult<(Self, LoadOutcome)> {
        let bytes = match backend.read() {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(bytes),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        let (vault, outcome) = match bytes {
            None => {
                info!(backend = %backend.describe(), "no stored vault, starting empty");
                (Vault::new(), LoadOutcome::Fresh)
            }
            Some(bytes) => match attempt_open(&envelope, &bytes, passphrase) {
                Attempt::Decrypted(vault) => (vault, LoadOutcome::Decrypted),
                Attempt::LegacyPlaintext(vault) => {
                    warn!(backend = %backend.describe(), "loaded unencrypted legacy vault");
                    (vault, LoadOutcome::LegacyPlaintext)
                }
                Attempt::Unreadable(err) => return Err(err),
            },
        };

        let persistence = Self {
            backend,
            envelope,
            store: VaultStore::new(vault),
        };
        if outcome == LoadOutcome::Decrypted {
            persistence.store.mark_verified()?;
        }
        Ok((persistence, outcome))
    }

    /// The live vault
    pub fn store(&self) -> &VaultStore {
        &self.store
    }

    /// The envelope used for this vault
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Where the vault is persisted
    pub fn describe_backend(&self) -> String {
        self.backend.describe()
    }

    /// Serialize, encrypt and write the vault
    ///
    /// Nothing is written if encryption fails. A failed write leaves the
    /// in-memory vault as it was and is not retried.
    pub fn save(&self, passphrase: &[u8]) -> VaultResult<()> {
        let plaintext = self.store.serialize()?;
        let blob = self.envelope.encrypt(&plaintext, passphrase)?;
        self.backend.write(&blob)?;
        info!(backend = %self.backend.describe(), "vault saved");
        Ok(())
    }

    /// Replace the live vault with a backup sealed under the vault passphrase
    pub fn restore(&self, backup: &[u8], passphrase: &[u8]) -> VaultResult<usize> {
        self.restore_with(backup, passphrase, passphrase)
    }

    /// Replace the live vault with a backup sealed under `backup_passphrase`,
    /// then persist it under `vault_passphrase`
    ///
    /// The live vault is untouched unless the backup decrypts and parses.
    pub fn restore_with(
        &self,
        backup: &[u8],
        backup_passphrase: &[u8],
        vault_passphrase: &[u8],
    ) -> VaultResult<usize> {
        let plaintext = self.envelope.decrypt(backup, backup_passphrase)?;
        let replacement = Vault::from_slice(&plaintext)
            .map_err(|e| VaultError::MalformedInput(format!("Backup is not a vault: {}", e)))?;
        let count = replacement.accounts.len();

        self.store.replace(replacement)?;
        info!(entries = count, "vault restored from backup");

        self.save(vault_passphrase)?;
        Ok(count)
    }

    /// Read a backup file from disk and restore it
    pub fn restore_from_path(
        &self,
        path: &Path,
        backup_passphrase: &[u8],
        vault_passphrase: &[u8],
    ) -> VaultResult<usize> {
        let bytes = read_bytes(path).map_err(|e| {
            if e.is_not_found() {
                VaultError::backup_not_found(path.display().to_string())
            } else {
                e
            }
        })?;
        self.restore_with(&bytes, backup_passphrase, vault_passphrase)
    }
}

fn attempt_open(envelope: &Envelope, bytes: &[u8], passphrase: &[u8]) -> Attempt {
    match envelope.decrypt(bytes, passphrase) {
        Ok(plaintext) => match Vault::from_slice(&plaintext) {
            Ok(vault) => Attempt::Decrypted(vault),
            Err(e) => Attempt::Unreadable(VaultError::MalformedInput(format!(
                "Decrypted vault could not be parsed: {}",
                e
            ))),
        },
        Err(err @ (VaultError::AuthenticationFailure | VaultError::MalformedInput(_))) => {
            match Vault::from_slice(bytes) {
                Ok(vault) => Attempt::LegacyPlaintext(vault),
                Err(_) => Attempt::Unreadable(err),
            }
        }
        Err(err) => Attempt::Unreadable(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyDerivationParams;
    use crate::models::Credential;
    use crate::storage::MemoryBackend;
    use std::sync::Arc;

    fn envelope() -> Envelope {
        Envelope::new(KeyDerivationParams::fast())
    }

    fn cred(name: &str, url: &str) -> Credential {
        Credential::new(name, "user", "pw123456", url).unwrap()
    }

    /// Backend whose writes always fail
    struct FailingBackend;

    impl Backend for FailingBackend {
        fn read(&self) -> VaultResult<Vec<u8>> {
            Err(VaultError::backend_not_found("failing"))
        }

        fn write(&self, _data: &[u8]) -> VaultResult<()> {
            Err(VaultError::Backend("disk full".into()))
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    fn load_from(backend: &Arc<MemoryBackend>, passphrase: &[u8]) -> VaultResult<(VaultPersistence, LoadOutcome)> {
        VaultPersistence::load(Box::new(Arc::clone(backend)), envelope(), passphrase)
    }

    #[test]
    fn test_load_missing_is_fresh() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, outcome) = load_from(&backend, b"pass").unwrap();

        assert_eq!(outcome, LoadOutcome::Fresh);
        assert!(persistence.store().is_empty().unwrap());
    }

    #[test]
    fn test_load_empty_payload_is_fresh() {
        let backend = Arc::new(MemoryBackend::with_bytes(Vec::new()));
        let (_, outcome) = load_from(&backend, b"pass").unwrap();
        assert_eq!(outcome, LoadOutcome::Fresh);
    }

    #[test]
    fn test_save_then_load() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, _) = load_from(&backend, b"master").unwrap();
        persistence.store().add(cred("GitHub", "https://github.com")).unwrap();
        persistence.save(b"master").unwrap();

        // Stored bytes are not the plaintext
        let stored = backend.contents().unwrap();
        assert!(!String::from_utf8_lossy(&stored).contains("github.com"));

        let (reloaded, outcome) = load_from(&backend, b"master").unwrap();
        assert_eq!(outcome, LoadOutcome::Decrypted);
        let vault = reloaded.store().snapshot().unwrap();
        assert_eq!(vault.accounts.len(), 1);
        assert!(vault.is_verified());
    }

    #[test]
    fn test_load_wrong_passphrase_is_authentication_failure() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, _) = load_from(&backend, b"master").unwrap();
        persistence.store().add(cred("GitHub", "https://github.com")).unwrap();
        persistence.save(b"master").unwrap();

        let err = load_from(&backend, b"wrong").err().unwrap();
        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_load_legacy_plaintext() {
        let legacy = br#"{"accounts":[{"name":"Old","login":"me","password":"pw",
            "url":"https://old.example","createdAt":"2024-01-01T00:00:00Z",
            "updatedAt":"2024-01-01T00:00:00Z"}],"updatedAt":"2024-01-01T00:00:00Z"}"#;
        let backend = Arc::new(MemoryBackend::with_bytes(legacy.to_vec()));

        let (persistence, outcome) = load_from(&backend, b"anything").unwrap();
        assert_eq!(outcome, LoadOutcome::LegacyPlaintext);
        assert_eq!(persistence.store().len().unwrap(), 1);

        // Saving migrates it to an envelope
        persistence.save(b"anything").unwrap();
        let (_, outcome) = load_from(&backend, b"anything").unwrap();
        assert_eq!(outcome, LoadOutcome::Decrypted);
    }

    #[test]
    fn test_load_short_legacy_plaintext() {
        let backend = Arc::new(MemoryBackend::with_bytes(br#"{"accounts":[]}"#.to_vec()));
        let (_, outcome) = load_from(&backend, b"pass").unwrap();
        assert_eq!(outcome, LoadOutcome::LegacyPlaintext);
    }

    #[test]
    fn test_load_garbage_is_error() {
        let backend = Arc::new(MemoryBackend::with_bytes(vec![0xAB; 128]));
        let err = load_from(&backend, b"pass").err().unwrap();
        assert!(err.is_authentication_failure());

        let backend = Arc::new(MemoryBackend::with_bytes(vec![0xAB; 10]));
        let err = load_from(&backend, b"pass").err().unwrap();
        assert!(matches!(err, VaultError::MalformedInput(_)));
    }

    #[test]
    fn test_decrypted_but_unparseable_is_malformed() {
        let blob = envelope().encrypt(b"definitely not json", b"pass").unwrap();
        let backend = Arc::new(MemoryBackend::with_bytes(blob));

        let err = load_from(&backend, b"pass").err().unwrap();
        assert!(matches!(err, VaultError::MalformedInput(_)));
    }

    #[test]
    fn test_failed_write_surfaces_and_keeps_memory() {
        let (persistence, _) =
            VaultPersistence::load(Box::new(FailingBackend), envelope(), b"pass").unwrap();
        persistence.store().add(cred("A", "https://a.com")).unwrap();

        let err = persistence.save(b"pass").unwrap_err();
        assert!(matches!(err, VaultError::Backend(_)));
        assert_eq!(persistence.store().len().unwrap(), 1);
    }

    #[test]
    fn test_restore_replaces_not_merges() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, _) = load_from(&backend, b"master").unwrap();
        persistence.store().add(cred("One", "https://one.example")).unwrap();
        persistence.store().add(cred("Two", "https://two.example")).unwrap();

        let mut backup = Vault::new();
        backup.accounts.push(cred("Three", "https://three.example"));
        let backup_blob = envelope()
            .encrypt(&serde_json::to_vec(&backup).unwrap(), b"master")
            .unwrap();

        let restored = persistence.restore(&backup_blob, b"master").unwrap();
        assert_eq!(restored, 1);

        let vault = persistence.store().snapshot().unwrap();
        assert_eq!(vault.accounts.len(), 1);
        assert_eq!(vault.accounts[0].name, "Three");

        // Restore persisted immediately
        let (reloaded, _) = load_from(&backend, b"master").unwrap();
        assert_eq!(reloaded.store().len().unwrap(), 1);
    }

    #[test]
    fn test_restore_with_separate_passphrases() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, _) = load_from(&backend, b"master").unwrap();

        let mut backup = Vault::new();
        backup.accounts.push(cred("Saved", "https://saved.example"));
        let blob = envelope()
            .encrypt(&serde_json::to_vec(&backup).unwrap(), b"Backup#2025")
            .unwrap();

        persistence.restore_with(&blob, b"Backup#2025", b"master").unwrap();

        let (reloaded, outcome) = load_from(&backend, b"master").unwrap();
        assert_eq!(outcome, LoadOutcome::Decrypted);
        assert_eq!(reloaded.store().len().unwrap(), 1);
    }

    #[test]
    fn test_failed_restore_leaves_vault_untouched() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, _) = load_from(&backend, b"master").unwrap();
        persistence.store().add(cred("Keep", "https://keep.example")).unwrap();

        let blob = envelope().encrypt(b"{}", b"other").unwrap();
        let err = persistence.restore(&blob, b"master").unwrap_err();
        assert!(err.is_authentication_failure());

        let not_a_vault = envelope().encrypt(b"\"text\"", b"master").unwrap();
        let err = persistence.restore(&not_a_vault, b"master").unwrap_err();
        assert!(matches!(err, VaultError::MalformedInput(_)));

        assert_eq!(persistence.store().len().unwrap(), 1);
        assert!(backend.contents().is_none());
    }

    #[test]
    fn test_restore_from_missing_path() {
        let backend = Arc::new(MemoryBackend::new());
        let (persistence, _) = load_from(&backend, b"master").unwrap();

        let err = persistence
            .restore_from_path(Path::new("/nonexistent/vault_backup.enc"), b"m", b"m")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
