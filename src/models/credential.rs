//! Credential model
//!
//! A named login/password pair bound to the URL it is used for.

use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Characters drawn from when generating a password
pub const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Length of generated passwords unless configured otherwise
pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// A stored credential
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Display name (e.g., "GitHub")
    #[serde(default)]
    pub name: String,

    /// Login identifier; never empty
    pub login: String,

    /// The secret itself
    pub password: String,

    /// Absolute URL the credential belongs to
    pub url: String,

    /// When the credential was created
    pub created_at: DateTime<Utc>,

    /// When the credential was last modified
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a validated credential, generating a password if `password` is empty
    pub fn new(
        name: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, CredentialValidationError> {
        Self::with_password_length(name, login, password, url, DEFAULT_PASSWORD_LENGTH)
    }

    /// Like [`Credential::new`], with an explicit length for a generated password
    pub fn with_password_length(
        name: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        generated_length: usize,
    ) -> Result<Self, CredentialValidationError> {
        let now = Utc::now();
        let mut password = password.into();
        if password.is_empty() {
            password = generate_password(generated_length);
        }

        let credential = Self {
            name: name.into(),
            login: login.into(),
            password,
            url: url.into(),
            created_at: now,
            updated_at: now,
        };
        credential.validate()?;
        Ok(credential)
    }

    /// Validate the credential
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        if self.login.is_empty() {
            return Err(CredentialValidationError::EmptyLogin);
        }

        Url::parse(&self.url)
            .map_err(|e| CredentialValidationError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        Ok(())
    }

    /// Password with all but the outer two characters on each side hidden
    pub fn masked_password(&self) -> String {
        mask_secret(&self.password)
    }

    /// Case-insensitive substring match against name, login or URL
    pub fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.login.to_lowercase().contains(query_lower)
            || self.url.to_lowercase().contains(query_lower)
    }
}

/// Generate a random password of `length` characters from [`PASSWORD_ALPHABET`]
pub fn generate_password(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}

/// Hide a secret for display
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}****{}", head, tail)
}

// Keep the secret out of logs and panic messages
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.login)
    }
}

/// Validation errors for credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    EmptyLogin,
    InvalidUrl(String),
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLogin => write!(f, "Login cannot be empty"),
            Self::InvalidUrl(detail) => write!(f, "Invalid URL {}", detail),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

impl From<CredentialValidationError> for crate::error::VaultError {
    fn from(err: CredentialValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
