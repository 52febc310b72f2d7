//! Auto-clear timer for copied secrets
//!
//! At most one clear is pending at a time. Copying again cancels the
//! pending clear and starts a fresh countdown, so a clear never wipes a
//! newer secret early. Cancellation works by dropping the sender half of
//! a channel the timer thread waits on.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use super::Clipboard;
use crate::error::{VaultError, VaultResult};

struct Pending {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

/// Copies secrets and wipes them after a delay
pub struct ClipboardTimer {
    clipboard: Arc<dyn Clipboard>,
    delay: Duration,
    pending: Mutex<Option<Pending>>,
}

impl ClipboardTimer {
    pub fn new(clipboard: Arc<dyn Clipboard>, delay: Duration) -> Self {
        Self {
            clipboard,
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn pending(&self) -> VaultResult<MutexGuard<'_, Option<Pending>>> {
        self.pending
            .lock()
            .map_err(|e| VaultError::Clipboard(format!("Failed to acquire lock: {}", e)))
    }

    /// Copy `secret` and schedule a clear, replacing any earlier schedule
    pub fn copy_then_autoclear(&self, secret: &str) -> VaultResult<()> {
        let mut pending = self.pending()?;
        cancel(pending.take());

        self.clipboard.copy(secret)?;

        let (tx, rx) = mpsc::channel::<()>();
        let clipboard = Arc::clone(&self.clipboard);
        let delay = self.delay;
        let handle = thread::spawn(move || match rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                if let Err(e) = clipboard.clear() {
                    warn!(error = %e, "failed to clear clipboard");
                } else {
                    debug!("clipboard cleared");
                }
            }
            // Cancelled
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
        });

        *pending = Some(Pending { cancel: tx, handle });
        debug!(delay_secs = delay.as_secs(), "clipboard clear scheduled");
        Ok(())
    }

    /// Whether a clear is still scheduled
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().map_or(false, |p| !p.handle.is_finished()))
            .unwrap_or(false)
    }

    /// Cancel any scheduled clear and clear right now
    ///
    /// Called on exit so no secret outlives the program.
    pub fn flush(&self) -> VaultResult<()> {
        let had_pending = {
            let mut pending = self.pending()?;
            let taken = pending.take();
            let had = taken.as_ref().map_or(false, |p| !p.handle.is_finished());
            cancel(taken);
            had
        };

        if had_pending {
            self.clipboard.clear()?;
            debug!("clipboard flushed");
        }
        Ok(())
    }
}

impl Drop for ClipboardTimer {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush clipboard");
        }
    }
}

fn cancel(pending: Option<Pending>) {
    if let Some(Pending { cancel, handle }) = pending {
        drop(cancel);
        let _ = handle.join();
    }
}
