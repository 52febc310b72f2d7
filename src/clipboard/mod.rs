//! Clipboard access with timed auto-clear

pub mod timer;

pub use timer::ClipboardTimer;

use std::sync::{Mutex, MutexGuard};

use crate::error::{VaultError, VaultResult};

/// Something that can hold copied text
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> VaultResult<()>;
    fn clear(&self) -> VaultResult<()>;
}

/// The desktop clipboard
pub struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    /// Connect to the desktop clipboard; fails on headless systems
    pub fn new() -> VaultResult<Self> {
        let inner = arboard::Clipboard::new()
            .map_err(|e| VaultError::Clipboard(format!("Clipboard unavailable: {}", e)))?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    fn lock(&self) -> VaultResult<MutexGuard<'_, arboard::Clipboard>> {
        self.inner
            .lock()
            .map_err(|e| VaultError::Clipboard(format!("Failed to acquire lock: {}", e)))
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> VaultResult<()> {
        self.lock()?
            .set_text(text.to_owned())
            .map_err(|e| VaultError::Clipboard(format!("Failed to copy: {}", e)))
    }

    fn clear(&self) -> VaultResult<()> {
        // Overwrite first; some platforms ignore clear() for text
        let mut clipboard = self.lock()?;
        clipboard
            .set_text(String::new())
            .map_err(|e| VaultError::Clipboard(format!("Failed to clear: {}", e)))?;
        clipboard
            .clear()
            .map_err(|e| VaultError::Clipboard(format!("Failed to clear: {}", e)))
    }
}

/// In-process clipboard for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    contents: Option<String>,
    clears: usize,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, `None` once cleared
    pub fn contents(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.contents.clone())
    }

    /// How many times the clipboard was cleared
    pub fn clear_count(&self) -> usize {
        self.state.lock().map(|s| s.clears).unwrap_or(0)
    }

    fn state(&self) -> VaultResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| VaultError::Clipboard(format!("Failed to acquire lock: {}", e)))
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) -> VaultResult<()> {
        self.state()?.contents = Some(text.to_string());
        Ok(())
    }

    fn clear(&self) -> VaultResult<()> {
        let mut state = self.state()?;
        state.contents = None;
        state.clears += 1;
        Ok(())
    }
}
