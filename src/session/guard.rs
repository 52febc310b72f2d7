//! Master passphrase verification with remember window and lockout
//!
//! A passphrase is checked by decrypting a stored token envelope. After a
//! success the SHA-256 of the passphrase is remembered for a short window
//! so repeated gated actions skip the slow key derivation. Three failures
//! in a row block every gated action for twenty minutes, and the block is
//! persisted so restarting the program does not lift it.

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use crate::crypto::Envelope;
use crate::error::{VaultError, VaultResult};
use crate::storage::Backend;

use super::clock::Clock;
use super::lockout::LockoutStore;

/// Plaintext sealed inside the token envelope
pub const VERIFICATION_TOKEN: &str = "MASTER_PASSWORD_VERIFIED";

/// Consecutive failures allowed before the lockout engages
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// How long a verified passphrase is remembered
pub fn remember_window() -> Duration {
    Duration::minutes(10)
}

/// How long the lockout lasts
pub fn lockout_duration() -> Duration {
    Duration::minutes(20)
}

/// Observable guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No token has been written yet
    Unset,
    /// Too many failures; gated actions are refused
    LockedOut,
    /// Token exists, nothing remembered
    AwaitingVerification,
    /// Last success came from the remembered hash
    VerifiedRemembered,
    /// Last success came from decrypting the token
    VerifiedFresh,
}

#[derive(Default)]
struct Remembered {
    hash: Option<[u8; 32]>,
    until: Option<DateTime<Utc>>,
    from_cache: bool,
}

impl Remembered {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.hash.is_some() && self.until.map_or(false, |until| now < until)
    }

    fn forget(&mut self) {
        if let Some(hash) = self.hash.as_mut() {
            hash.zeroize();
        }
        self.hash = None;
        self.until = None;
        self.from_cache = false;
    }
}

impl Drop for Remembered {
    fn drop(&mut self) {
        self.forget();
    }
}

#[derive(Debug, Default)]
struct Attempts {
    failed: u32,
    blocked_until: Option<DateTime<Utc>>,
}

/// Gatekeeper for sensitive vault operations
pub struct SessionGuard {
    envelope: Envelope,
    token: Box<dyn Backend>,
    lockout: Box<dyn LockoutStore>,
    clock: Arc<dyn Clock>,
    remembered: RwLock<Remembered>,
    attempts: Mutex<Attempts>,
}

impl SessionGuard {
    /// Build a guard and pick up any lockout left by a previous run
    pub fn new(
        envelope: Envelope,
        token: Box<dyn Backend>,
        lockout: Box<dyn LockoutStore>,
        clock: Arc<dyn Clock>,
    ) -> VaultResult<Self> {
        let guard = Self {
            envelope,
            token,
            lockout,
            clock,
            remembered: RwLock::new(Remembered::default()),
            attempts: Mutex::new(Attempts::default()),
        };
        guard.restore_lockout()?;
        Ok(guard)
    }

    fn restore_lockout(&self) -> VaultResult<()> {
        let Some(until) = self.lockout.load()? else {
            return Ok(());
        };

        if self.clock.now() < until {
            warn!(until = %until, "lockout from a previous session is still active");
            self.attempts()?.blocked_until = Some(until);
        } else {
            debug!("clearing expired lockout sentinel");
            self.lockout.clear()?;
        }
        Ok(())
    }

    fn attempts(&self) -> VaultResult<MutexGuard<'_, Attempts>> {
        self.attempts
            .lock()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    fn remembered_write(&self) -> VaultResult<RwLockWriteGuard<'_, Remembered>> {
        self.remembered
            .write()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Whether a verification token has been written
    pub fn has_token(&self) -> VaultResult<bool> {
        match self.token.read() {
            Ok(bytes) => Ok(!bytes.is_empty()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Seal the token under `passphrase`, making it the master passphrase
    pub fn bootstrap(&self, passphrase: &[u8]) -> VaultResult<()> {
        let blob = self
            .envelope
            .encrypt(VERIFICATION_TOKEN.as_bytes(), passphrase)?;
        self.token.write(&blob)?;
        info!(location = %self.token.describe(), "master passphrase token written");

        self.remember(passphrase, false)?;
        self.attempts()?.failed = 0;
        Ok(())
    }

    /// `Err(Blocked)` while the lockout is active; lifts an expired one
    pub fn ensure_unlocked(&self) -> VaultResult<()> {
        let now = self.clock.now();
        let mut attempts = self.attempts()?;

        match attempts.blocked_until {
            Some(until) if now < until => Err(VaultError::Blocked {
                remaining: until - now,
            }),
            Some(_) => {
                info!("lockout expired");
                attempts.blocked_until = None;
                attempts.failed = 0;
                drop(attempts);
                self.lockout.clear()
            }
            None => Ok(()),
        }
    }

    /// Check `passphrase` against the master passphrase
    ///
    /// Returns `Ok(false)` for a wrong passphrase or a missing token, and
    /// `Err(Blocked)` without inspecting the passphrase while locked out.
    /// Backend failures other than a missing token are propagated and do
    /// not count as an attempt.
    pub fn verify(&self, passphrase: &[u8]) -> VaultResult<bool> {
        self.ensure_unlocked()?;
        let now = self.clock.now();

        if self.matches_remembered(passphrase, now)? {
            debug!("passphrase accepted from remembered hash");
            self.attempts()?.failed = 0;
            self.remembered_write()?.from_cache = true;
            return Ok(true);
        }

        let accepted = match self.token.read() {
            Ok(blob) => match self.envelope.decrypt(&blob, passphrase) {
                Ok(plaintext) => plaintext == VERIFICATION_TOKEN.as_bytes(),
                Err(VaultError::AuthenticationFailure) | Err(VaultError::MalformedInput(_)) => {
                    false
                }
                Err(e) => return Err(e),
            },
            Err(e) if e.is_not_found() => false,
            Err(e) => return Err(e),
        };

        if accepted {
            self.attempts()?.failed = 0;
            self.remember(passphrase, false)?;
            debug!("passphrase accepted from token");
        } else {
            self.record_failure(now)?;
        }
        Ok(accepted)
    }

    /// Like [`verify`](Self::verify) but a rejection is an error
    pub fn gate(&self, passphrase: &[u8]) -> VaultResult<()> {
        if self.verify(passphrase)? {
            Ok(())
        } else {
            Err(VaultError::AuthenticationFailure)
        }
    }

    fn matches_remembered(&self, passphrase: &[u8], now: DateTime<Utc>) -> VaultResult<bool> {
        let remembered = self
            .remembered
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        if !remembered.is_live(now) {
            return Ok(false);
        }
        let Some(stored) = remembered.hash.as_ref() else {
            return Ok(false);
        };

        let mut candidate = hash_passphrase(passphrase);
        let equal = constant_time_eq(stored, &candidate);
        candidate.zeroize();
        Ok(equal)
    }

    fn remember(&self, passphrase: &[u8], from_cache: bool) -> VaultResult<()> {
        let until = self.clock.now() + remember_window();
        let mut remembered = self.remembered_write()?;
        remembered.forget();
        remembered.hash = Some(hash_passphrase(passphrase));
        remembered.until = Some(until);
        remembered.from_cache = from_cache;
        Ok(())
    }

    fn record_failure(&self, now: DateTime<Utc>) -> VaultResult<()> {
        let mut attempts = self.attempts()?;
        attempts.failed += 1;
        warn!(
            failed = attempts.failed,
            max = MAX_FAILED_ATTEMPTS,
            "passphrase rejected"
        );

        if attempts.failed < MAX_FAILED_ATTEMPTS {
            return Ok(());
        }

        let until = now + lockout_duration();
        attempts.blocked_until = Some(until);
        drop(attempts);

        self.remembered_write()?.forget();
        warn!(until = %until, "too many failed attempts, locking out");

        // The in-memory block holds even if the sentinel cannot be written
        if let Err(e) = self.lockout.store(until) {
            warn!(error = %e, "failed to persist lockout sentinel");
        }
        Ok(())
    }

    /// Consecutive failures since the last success
    pub fn failed_attempts(&self) -> VaultResult<u32> {
        Ok(self.attempts()?.failed)
    }

    /// Failures left before the lockout engages
    pub fn remaining_attempts(&self) -> VaultResult<u32> {
        Ok(MAX_FAILED_ATTEMPTS.saturating_sub(self.failed_attempts()?))
    }

    /// Whether the lockout is currently active
    pub fn is_locked_out(&self) -> VaultResult<bool> {
        let now = self.clock.now();
        Ok(self
            .attempts()?
            .blocked_until
            .map_or(false, |until| now < until))
    }

    /// When the active lockout ends, if one is active
    pub fn blocked_until(&self) -> VaultResult<Option<DateTime<Utc>>> {
        let now = self.clock.now();
        Ok(self.attempts()?.blocked_until.filter(|until| now < *until))
    }

    /// Current state, for display
    pub fn state(&self) -> VaultResult<GuardState> {
        if self.is_locked_out()? {
            return Ok(GuardState::LockedOut);
        }
        if !self.has_token()? {
            return Ok(GuardState::Unset);
        }

        let now = self.clock.now();
        let remembered = self
            .remembered
            .read()
            .map_err(|e| VaultError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(match (remembered.is_live(now), remembered.from_cache) {
            (true, true) => GuardState::VerifiedRemembered,
            (true, false) => GuardState::VerifiedFresh,
            (false, _) => GuardState::AwaitingVerification,
        })
    }

    /// Forget the remembered hash and its expiry
    ///
    /// The failure counter and any persisted lockout are left in place.
    pub fn reset(&self) -> VaultResult<()> {
        self.remembered_write()?.forget();
        debug!("session guard reset");
        Ok(())
    }
}

fn hash_passphrase(passphrase: &[u8]) -> [u8; 32] {
    Sha256::digest(passphrase).into()
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
