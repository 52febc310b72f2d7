//! Interactive command-line session
//!
//! Wires the configured storage, guard, clipboard, backups and audit log
//! into a [`Session`] and runs its menu on standard input and output.

pub mod prompt;
pub mod session;
pub mod storage;

pub use prompt::Console;
pub use session::{Services, Session};
pub use storage::choose_backend;

use std::sync::Arc;

use tracing::warn;

use crate::audit::AuditLogger;
use crate::backup::BackupManager;
use crate::clipboard::{Clipboard, ClipboardTimer, MemoryClipboard, SystemClipboard};
use crate::config::{Settings, VaultPaths};
use crate::crypto::{Envelope, KeyDerivationParams};
use crate::error::VaultResult;
use crate::session::{FileLockoutStore, SessionGuard, SystemClock};
use crate::storage::FileBackend;

/// Run the interactive session against the files under `paths`
pub fn run_interactive(paths: &VaultPaths, settings: &Settings) -> VaultResult<()> {
    paths.ensure_directories()?;
    let mut console = Console::stdio();

    let envelope = Envelope::new(KeyDerivationParams::runtime());
    let guard = SessionGuard::new(
        envelope,
        Box::new(FileBackend::new(paths.token_file())),
        Box::new(FileLockoutStore::new(paths.lockout_file())),
        Arc::new(SystemClock),
    )?;

    if let Err(e) = guard.ensure_unlocked() {
        if e.is_blocked() {
            console.say(&e)?;
            console.say("Close the program and try again later.")?;
            return Ok(());
        }
        return Err(e);
    }

    console.say("== vaultkeeper ==")?;
    let backend = choose_backend(&mut console, paths, settings)?;

    let clipboard: Arc<dyn Clipboard> = match SystemClipboard::new() {
        Ok(clipboard) => Arc::new(clipboard),
        Err(e) => {
            warn!(error = %e, "system clipboard unavailable");
            console.say("System clipboard unavailable; copied passwords stay inside this session.")?;
            Arc::new(MemoryClipboard::new())
        }
    };

    let services = Services {
        guard,
        clipboard: ClipboardTimer::new(clipboard, settings.clipboard_clear_delay()),
        backups: BackupManager::new(paths.backup_dir(), settings.backup_retention.clone()),
        audit: AuditLogger::new(paths.audit_log()),
        password_length: settings.password_length,
    };

    match Session::open(console, backend, envelope, services)? {
        Some(mut session) => session.run(),
        None => Ok(()),
    }
}
