//! The interactive menu session
//!
//! Startup authenticates (or creates) the master passphrase and loads the
//! vault. The menu loop then dispatches one action per choice. Finding,
//! deleting, copying and restoring ask for the master passphrase through
//! the session guard first.

use std::path::PathBuf;

use tracing::warn;
use url::Url;

use super::prompt::Console;
use crate::audit::{AuditEntry, AuditLogger};
use crate::backup::{check_passphrase_strength, BackupManager};
use crate::clipboard::ClipboardTimer;
use crate::crypto::{Envelope, SecureString};
use crate::display::{format_choices, format_credential_list};
use crate::error::{VaultError, VaultResult};
use crate::models::Credential;
use crate::session::SessionGuard;
use crate::storage::Backend;
use crate::vault::{LoadOutcome, VaultPersistence};

/// Shortest generated password offered in the menu
pub const MIN_GENERATED_LENGTH: usize = 8;

/// Longest generated password offered in the menu
pub const MAX_GENERATED_LENGTH: usize = 128;

const MENU: &str = "
== vaultkeeper ==
1. Create credential
2. Find credential
3. Delete credential
4. Exit
5. Generate password
6. Copy password to clipboard
7. Back up vault
8. Restore vault from backup
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Create,
    Find,
    Delete,
    Exit,
    Generate,
    Copy,
    Backup,
    Restore,
}

impl MenuItem {
    fn parse(choice: &str) -> Option<Self> {
        Some(match choice {
            "1" => Self::Create,
            "2" => Self::Find,
            "3" => Self::Delete,
            "4" => Self::Exit,
            "5" => Self::Generate,
            "6" => Self::Copy,
            "7" => Self::Backup,
            "8" => Self::Restore,
            _ => return None,
        })
    }
}

/// Long-lived collaborators of a session
pub struct Services {
    pub guard: SessionGuard,
    pub clipboard: ClipboardTimer,
    pub backups: BackupManager,
    pub audit: AuditLogger,
    /// Length of passwords generated for new credentials
    pub password_length: usize,
}

/// An unlocked vault and the console driving it
pub struct Session {
    console: Console,
    persistence: VaultPersistence,
    services: Services,
    master: SecureString,
}

impl Session {
    /// Authenticate and load the vault
    ///
    /// Returns `Ok(None)` when the guard refuses access. A vault that
    /// cannot be decrypted with an accepted passphrase is an error.
    pub fn open(
        mut console: Console,
        backend: Box<dyn Backend>,
        envelope: Envelope,
        services: Services,
    ) -> VaultResult<Option<Self>> {
        if let Err(e) = services.guard.ensure_unlocked() {
            if e.is_blocked() {
                console.say(&e)?;
                console.say("Close the program and try again later.")?;
                return Ok(None);
            }
            return Err(e);
        }

        let has_token = services.guard.has_token()?;
        let master = if has_token {
            match authenticate_master(&mut console, &services)? {
                Some(master) => master,
                None => return Ok(None),
            }
        } else {
            console.say("No master passphrase is set yet.")?;
            ask_new_master(&mut console)?
        };

        let (persistence, outcome) =
            match VaultPersistence::load(backend, envelope, master.as_bytes()) {
                Ok(loaded) => loaded,
                Err(e @ (VaultError::AuthenticationFailure | VaultError::MalformedInput(_))) => {
                    console.bell()?;
                    console.say("Wrong passphrase or corrupted store.")?;
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

        if !has_token {
            services.guard.bootstrap(master.as_bytes())?;
        }

        match outcome {
            LoadOutcome::Fresh => console.say("No stored vault found. Starting a new one.")?,
            LoadOutcome::Decrypted => {
                console.say(format!(
                    "Vault loaded from {}.",
                    persistence.describe_backend()
                ))?;
            }
            LoadOutcome::LegacyPlaintext => {
                console.say("Found an unencrypted vault. Encrypting it now.")?;
                persistence.save(master.as_bytes())?;
            }
        }

        Ok(Some(Self {
            console,
            persistence,
            services,
            master,
        }))
    }

    /// Run the menu until the user exits or input ends, then close
    pub fn run(&mut self) -> VaultResult<()> {
        loop {
            self.console.print(MENU)?;
            let choice = match self.console.ask("Choose an option: ") {
                Ok(choice) => choice,
                Err(e) if e.is_input_closed() => break,
                Err(e) => return Err(e),
            };

            let Some(item) = MenuItem::parse(&choice) else {
                self.console.say("Invalid choice. Try again.")?;
                continue;
            };
            if item == MenuItem::Exit {
                break;
            }

            match self.dispatch(item) {
                Ok(()) => {}
                Err(e) if e.is_input_closed() => break,
                Err(e) => {
                    warn!(error = %e, "menu action failed");
                    self.console.say(format!("Error: {}", e))?;
                }
            }
        }

        self.close()
    }

    fn dispatch(&mut self, item: MenuItem) -> VaultResult<()> {
        match item {
            MenuItem::Create => self.create_credential(),
            MenuItem::Find => self.find_credentials(),
            MenuItem::Delete => self.delete_credentials(),
            MenuItem::Generate => self.generate_password(),
            MenuItem::Copy => self.copy_password(),
            MenuItem::Backup => self.backup_vault(),
            MenuItem::Restore => self.restore_vault(),
            MenuItem::Exit => Ok(()),
        }
    }

    /// Save, wipe the clipboard and forget the remembered passphrase
    pub fn close(&mut self) -> VaultResult<()> {
        let saved = self.persistence.save(self.master.as_bytes());

        let cleared = self.services.clipboard.is_pending();
        if cleared {
            self.services.clipboard.flush()?;
        }
        self.services.guard.reset()?;

        if cleared {
            self.console.say("Clipboard cleared.")?;
        }
        match &saved {
            Ok(()) => self.console.say("Vault saved. Goodbye.")?,
            Err(e) => self.console.say(format!("Failed to save vault: {}", e))?,
        }
        saved
    }

    fn create_credential(&mut self) -> VaultResult<()> {
        let name = self.console.ask("Name (e.g. GitHub): ")?;
        let login = self.console.ask_required("Login: ")?;
        let password = self
            .console
            .ask_secret("Password (leave empty to generate): ")?;
        let url = self.console.ask_until("URL: ", |answer| {
            Url::parse(answer)
                .map(|_| answer.to_string())
                .map_err(|e| format!("Invalid URL: {}", e))
        })?;

        let generated = password.is_empty();
        let credential = Credential::with_password_length(
            name,
            login,
            password.as_str(),
            url,
            self.services.password_length,
        )?;
        let entry = AuditEntry::credential_created(&credential);

        self.persistence.store().add(credential)?;
        self.persist()?;
        self.record(&entry);

        if generated {
            self.console.say(format!(
                "Generated a {}-character password. Use option 6 to copy it.",
                self.services.password_length
            ))?;
        }
        Ok(())
    }

    fn find_credentials(&mut self) -> VaultResult<()> {
        if !self.authorize()? {
            return Ok(());
        }

        let query = self.console.ask("Search (name, login or URL): ")?;
        let found = self.persistence.store().search(&query)?;
        self.console.print(&format_credential_list(&found))?;
        if found.is_empty() {
            self.console.say("")?;
        }
        Ok(())
    }

    fn delete_credentials(&mut self) -> VaultResult<()> {
        if !self.authorize()? {
            return Ok(());
        }

        let fragment = self.console.ask("Full or partial URL: ")?;
        if fragment.is_empty()
            && !self
                .console
                .confirm("An empty pattern deletes every credential. Continue? [y/N] ")?
        {
            self.console.say("Nothing deleted.")?;
            return Ok(());
        }

        let removed = self.persistence.store().delete_by_locator(&fragment)?;
        if removed == 0 {
            self.console.say("No credential matched.")?;
            return Ok(());
        }

        self.console
            .say(format!("Deleted {} credential(s).", removed))?;
        self.persist()?;
        self.record(&AuditEntry::credentials_deleted(&fragment, removed));
        Ok(())
    }

    fn generate_password(&mut self) -> VaultResult<()> {
        let prompt = format!(
            "Password length ({}-{}): ",
            MIN_GENERATED_LENGTH, MAX_GENERATED_LENGTH
        );
        let requested = self.console.ask_until(&prompt, |answer| {
            answer
                .parse::<usize>()
                .map_err(|_| "Enter a number.".to_string())
        })?;

        let length = if (MIN_GENERATED_LENGTH..=MAX_GENERATED_LENGTH).contains(&requested) {
            requested
        } else {
            self.console.say(format!(
                "Length out of range, using {}.",
                self.services.password_length
            ))?;
            self.services.password_length
        };

        let password = SecureString::new(crate::models::generate_password(length));
        self.console.say(format!("Generated: {}", password.as_str()))
    }

    fn copy_password(&mut self) -> VaultResult<()> {
        if !self.authorize()? {
            return Ok(());
        }

        let query = self.console.ask("Search (name, login or URL): ")?;
        let found = self.persistence.store().search(&query)?;

        let selected = match found.len() {
            0 => {
                self.console.say("Nothing found.")?;
                return Ok(());
            }
            1 => &found[0],
            n => {
                self.console.say("Several credentials match:")?;
                self.console.print(&format_choices(&found))?;
                let index = self.console.ask_number("Choose a number: ", 1..=n)?;
                &found[index - 1]
            }
        };

        self.services
            .clipboard
            .copy_then_autoclear(&selected.password)?;
        self.console.say(format!(
            "Password for {} copied. The clipboard clears in {} seconds.",
            selected,
            self.services.clipboard.delay().as_secs()
        ))
    }

    fn backup_vault(&mut self) -> VaultResult<()> {
        let passphrase = self.console.ask_secret("Backup passphrase: ")?;
        if let Err(weak) = check_passphrase_strength(&passphrase) {
            self.console.say(weak)?;
            self.console.say(
                "Use 8+ characters with upper and lower case letters, a digit and a symbol.",
            )?;
            return Ok(());
        }

        let snapshot = self.persistence.store().serialize()?;
        let (path, pruned) = self.services.backups.create_backup_with_retention(
            &snapshot,
            self.persistence.envelope(),
            &passphrase,
        )?;

        self.record(&AuditEntry::backup_created(
            path.display().to_string(),
            pruned.len(),
        ));
        self.console
            .say(format!("Encrypted backup created: {}", path.display()))
    }

    fn restore_vault(&mut self) -> VaultResult<()> {
        if !self.authorize()? {
            return Ok(());
        }

        let latest = self.services.backups.get_latest_backup()?;
        let prompt = match &latest {
            Some(info) => format!("Backup file [{}]: ", info.path.display()),
            None => "Backup file: ".to_string(),
        };
        let answer = self.console.ask(&prompt)?;

        let path = match (answer.is_empty(), latest) {
            (false, _) => PathBuf::from(answer),
            (true, Some(info)) => info.path,
            (true, None) => {
                self.console.say("No backups found.")?;
                return Ok(());
            }
        };

        let passphrase = self.console.ask_secret("Backup passphrase: ")?;
        let restored = match self.persistence.restore_from_path(
            &path,
            passphrase.as_bytes(),
            self.master.as_bytes(),
        ) {
            Ok(count) => count,
            Err(VaultError::AuthenticationFailure) => {
                self.console.bell()?;
                self.console.say("Wrong passphrase or corrupted backup.")?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.record(&AuditEntry::vault_restored(
            path.display().to_string(),
            restored,
        ));
        self.console
            .say(format!("Restored {} credential(s). Vault saved.", restored))
    }

    /// Ask for the master passphrase and check it with the guard
    fn authorize(&mut self) -> VaultResult<bool> {
        if let Err(e) = self.services.guard.ensure_unlocked() {
            if e.is_blocked() {
                self.console.say(&e)?;
                return Ok(false);
            }
            return Err(e);
        }

        let passphrase = self.console.ask_secret("Master passphrase: ")?;
        match self.services.guard.gate(passphrase.as_bytes()) {
            Ok(()) => Ok(true),
            Err(VaultError::AuthenticationFailure) => {
                report_rejection(&mut self.console, &self.services)?;
                Ok(false)
            }
            Err(e) if e.is_blocked() => {
                self.console.say(&e)?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn persist(&mut self) -> VaultResult<()> {
        self.persistence.save(self.master.as_bytes())?;
        self.console.say("Vault saved.")
    }

    fn record(&self, entry: &AuditEntry) {
        record(&self.services.audit, entry);
    }
}

fn record(audit: &AuditLogger, entry: &AuditEntry) {
    if let Err(e) = audit.log(entry) {
        warn!(error = %e, "failed to write audit entry");
    }
}

/// Prompt until the guard accepts the passphrase or locks out
fn authenticate_master(
    console: &mut Console,
    services: &Services,
) -> VaultResult<Option<SecureString>> {
    loop {
        let passphrase = console.ask_secret("Master passphrase: ")?;
        match services.guard.gate(passphrase.as_bytes()) {
            Ok(()) => return Ok(Some(passphrase)),
            Err(VaultError::AuthenticationFailure) => {
                report_rejection(console, services)?;
                if services.guard.is_locked_out()? {
                    return Ok(None);
                }
            }
            Err(e) if e.is_blocked() => {
                console.say(&e)?;
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Tell the user why the passphrase was refused, auditing a new lockout
fn report_rejection(console: &mut Console, services: &Services) -> VaultResult<()> {
    console.bell()?;
    match services.guard.blocked_until()? {
        Some(until) => {
            record(&services.audit, &AuditEntry::lockout(until));
            console.say("Too many failed attempts. Access is locked for 20 minutes.")
        }
        None => console.say(format!(
            "Wrong passphrase. Attempts left: {}",
            services.guard.remaining_attempts()?
        )),
    }
}

/// First run: choose the master passphrase, typed twice
fn ask_new_master(console: &mut Console) -> VaultResult<SecureString> {
    for _ in 0..super::prompt::MAX_PROMPT_ATTEMPTS {
        let first = console.ask_secret("New master passphrase: ")?;
        if first.is_empty() {
            console.say("The passphrase cannot be empty.")?;
            continue;
        }
        let second = console.ask_secret("Repeat master passphrase: ")?;
        if first.as_str() != second.as_str() {
            console.say("Passphrases do not match. Try again.")?;
            continue;
        }
        return Ok(first);
    }
    Err(VaultError::Validation(
        "Too many invalid answers".to_string(),
    ))
}
