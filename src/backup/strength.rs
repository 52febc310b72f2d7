//! Passphrase strength rules for backups

use std::fmt;

use crate::error::VaultError;

/// Minimum passphrase length for a backup
pub const MIN_BACKUP_PASSPHRASE_LEN: usize = 8;

/// Characters that count toward the special-character rule
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Why a passphrase was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeakPassphrase {
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecial,
}

impl fmt::Display for WeakPassphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(
                f,
                "Backup passphrase must be at least {} characters",
                MIN_BACKUP_PASSPHRASE_LEN
            ),
            Self::MissingUppercase => write!(f, "Backup passphrase needs an uppercase letter"),
            Self::MissingLowercase => write!(f, "Backup passphrase needs a lowercase letter"),
            Self::MissingDigit => write!(f, "Backup passphrase needs a digit"),
            Self::MissingSpecial => write!(
                f,
                "Backup passphrase needs one of {}",
                SPECIAL_CHARACTERS
            ),
        }
    }
}

impl std::error::Error for WeakPassphrase {}

impl From<WeakPassphrase> for VaultError {
    fn from(e: WeakPassphrase) -> Self {
        VaultError::Validation(e.to_string())
    }
}

/// Check a backup passphrase, reporting the first rule it breaks
pub fn check_passphrase_strength(passphrase: &str) -> Result<(), WeakPassphrase> {
    if passphrase.chars().count() < MIN_BACKUP_PASSPHRASE_LEN {
        return Err(WeakPassphrase::TooShort);
    }
    if !passphrase.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(WeakPassphrase::MissingUppercase);
    }
    if !passphrase.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(WeakPassphrase::MissingLowercase);
    }
    if !passphrase.chars().any(|c| c.is_ascii_digit()) {
        return Err(WeakPassphrase::MissingDigit);
    }
    if !passphrase.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Err(WeakPassphrase::MissingSpecial);
    }
    Ok(())
}
