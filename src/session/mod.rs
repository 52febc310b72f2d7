//! Session state: passphrase verification, remember window and lockout

pub mod clock;
pub mod guard;
pub mod lockout;

pub use clock::{Clock, ManualClock, SystemClock};
pub use guard::{GuardState, SessionGuard, MAX_FAILED_ATTEMPTS, VERIFICATION_TOKEN};
pub use lockout::{FileLockoutStore, LockoutStore, MemoryLockoutStore};
