//! Authentication primitives: login credentials and credential digests.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use rand::RngCore;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::{EmailAddress, UserValidationError};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or structurally invalid.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised by [`EmailAddress`].
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = EmailAddress::new(email).map_err(|err| match err {
            UserValidationError::InvalidEmail => LoginValidationError::InvalidEmail,
            _ => LoginValidationError::InvalidEmail,
        })?;

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email for user lookups.
    #[must_use]
    pub const fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Length of the random per-user salt in bytes.
const SALT_LEN: usize = 16;

/// Salted SHA-256 digest of a user's password.
///
/// Stored as `hex(salt)` and `hex(sha256(salt || password))`. Comparison is
/// constant time over the digest bytes. The wider ecosystem would reach for
/// a memory-hard KDF here; this internal tool keeps to the crates already in
/// its stack and records the trade-off in its design notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    salt_hex: String,
    digest_hex: String,
}

impl PasswordDigest {
    /// Digest a password under a freshly generated random salt.
    #[must_use]
    pub fn create(password: &str) -> Self {
        let mut salt = [0_u8; SALT_LEN];
        let mut rng = SmallRng::from_entropy();
        rng.fill_bytes(&mut salt);
        Self::with_salt(&salt, password)
    }

    /// Digest a password under the supplied salt.
    #[must_use]
    pub fn with_salt(salt: &[u8], password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        Self {
            salt_hex: hex::encode(salt),
            digest_hex: hex::encode(hasher.finalize()),
        }
    }

    /// Rehydrate a digest from its stored hex columns.
    #[must_use]
    pub fn from_stored(salt_hex: impl Into<String>, digest_hex: impl Into<String>) -> Self {
        Self {
            salt_hex: salt_hex.into(),
            digest_hex: digest_hex.into(),
        }
    }

    /// Hex-encoded salt for persistence.
    #[must_use]
    pub fn salt_hex(&self) -> &str {
        self.salt_hex.as_str()
    }

    /// Hex-encoded digest for persistence.
    #[must_use]
    pub fn digest_hex(&self) -> &str {
        self.digest_hex.as_str()
    }

    /// Check a candidate password against this digest in constant time.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let salt = match hex::decode(&self.salt_hex) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        let candidate = Self::with_salt(&salt, password);
        constant_time_eq(candidate.digest_hex.as_bytes(), self.digest_hex.as_bytes())
    }
}

/// Compare byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0_u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}
