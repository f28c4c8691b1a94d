// crates/siteboot-core/src/core/administrator.rs
// ============================================================================
// Module: Siteboot Administrator Model
// Description: Administrator accounts and predefined roles.
// Purpose: Build the bootstrap administrator written during installation.
// Dependencies: base64, rand, serde, sha2
// ============================================================================

//! ## Overview
//! Installation may create a first administrator account and grant it the
//! console administrator role. Passwords are never stored in clear text: each
//! record carries a random salt and the SHA-256 digest of `salt || password`,
//! both base64-encoded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Salt length in bytes.
const SALT_BYTES: usize = 16;
/// Maximum administrator user name length.
pub const MAX_USER_NAME_LENGTH: usize = 255;

// ============================================================================
// SECTION: Roles
// ============================================================================

/// Roles that exist in every installation.
///
/// # Invariants
/// - [`PredefinedRole::as_str`] values are persisted; they must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredefinedRole {
    /// Full console access across all sites.
    ConsoleAdministrator,
    /// Administration of assigned sites.
    SystemAdministrator,
    /// Regular administrator.
    Administrator,
}

impl PredefinedRole {
    /// Returns the persisted role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsoleAdministrator => "ConsoleAdministrator",
            Self::SystemAdministrator => "SystemAdministrator",
            Self::Administrator => "Administrator",
        }
    }
}

// ============================================================================
// SECTION: Administrator Record
// ============================================================================

/// Password storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordFormat {
    /// Base64 SHA-256 digest over the salt followed by the password bytes.
    Sha256,
}

impl PasswordFormat {
    /// Returns the persisted format label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }

    /// Parses a persisted format label.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Administrator account written by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdministratorRecord {
    /// Login name.
    pub user_name: String,
    /// Encoded password digest.
    pub password_hash: String,
    /// Base64-encoded salt.
    pub password_salt: String,
    /// Digest format.
    pub password_format: PasswordFormat,
    /// Creation timestamp (unix epoch milliseconds).
    pub created_at_ms: i64,
}

impl AdministratorRecord {
    /// Creates a record for `user_name` with a freshly salted password digest.
    #[must_use]
    pub fn with_password(user_name: &str, password: &str, created_at_ms: i64) -> Self {
        let mut salt = [0_u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        Self {
            user_name: user_name.to_string(),
            password_hash: digest_password(&salt, password),
            password_salt: STANDARD.encode(salt),
            password_format: PasswordFormat::Sha256,
            created_at_ms,
        }
    }

    /// Returns true when `password` matches the stored digest.
    #[must_use]
    pub fn verify_password(&self, password: &str) -> bool {
        let Ok(salt) = STANDARD.decode(&self.password_salt) else {
            return false;
        };
        match self.password_format {
            PasswordFormat::Sha256 => digest_password(&salt, password) == self.password_hash,
        }
    }
}

/// Computes the base64 SHA-256 digest of `salt || password`.
fn digest_password(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::AdministratorRecord;
    use super::PasswordFormat;

    #[test]
    fn password_digest_verifies_and_is_salted() {
        let first = AdministratorRecord::with_password("admin", "s3cret", 1);
        let second = AdministratorRecord::with_password("admin", "s3cret", 1);
        assert!(first.verify_password("s3cret"));
        assert!(!first.verify_password("S3cret"));
        assert_ne!(first.password_salt, second.password_salt);
        assert_ne!(first.password_hash, second.password_hash);
        assert_eq!(PasswordFormat::parse(first.password_format.as_str()), Some(PasswordFormat::Sha256));
    }
}
