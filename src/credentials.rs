//! Password hashing and verification.
//!
//! Plaintext passwords are hashed with bcrypt before storage: a salted,
//! adaptive one-way function whose cost (work factor) is tunable. Each call
//! salts freshly, so hashing the same plaintext twice yields different
//! secrets, and the stored secret self-describes its salt and parameters.
//! Verification recomputes the hash from the stored parameters and compares
//! digests in constant time.
//!
//! The plaintext is never logged, echoed, or persisted.

use std::fmt;

/// Default bcrypt work factor.
pub const DEFAULT_WORK_FACTOR: u32 = 10;

/// Failure while producing a password hash.
#[derive(Debug)]
pub struct CredentialError(String);

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl std::error::Error for CredentialError {}

/// One-way credential hashing with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct CredentialManager {
    work_factor: u32,
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::new(DEFAULT_WORK_FACTOR)
    }
}

impl CredentialManager {
    /// Manager with an explicit work factor (bcrypt rounds).
    pub fn new(work_factor: u32) -> Self {
        Self { work_factor }
    }

    /// Hash a plaintext password with a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        bcrypt::hash(plaintext, self.work_factor).map_err(|e| CredentialError(e.to_string()))
    }

    /// Check a plaintext against a stored secret.
    ///
    /// A stored secret that cannot be parsed verifies as `false` rather than
    /// erroring, so callers observe one uniform rejection path.
    pub fn verify(&self, plaintext: &str, secret: &str) -> bool {
        match bcrypt::verify(plaintext, secret) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::debug!(reason = %e, "stored credential could not be parsed");
                false
            }
        }
    }
}
