//! Credential verification and password hashing
//!
//! Passwords are hashed with argon2id and a per-record random salt, so
//! identical passwords never produce identical hashes. Verification is a
//! cost-parameterized recomputation, never a string comparison.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::auth::identity::{Identity, Role};
use crate::error::{Result, SiteKeeperError};
use crate::storage::traits::SharedStorage;

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SiteKeeperError::AuthError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash
///
/// An unparseable stored hash verifies as false rather than erroring; the
/// caller only ever branches on match/no-match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Verifies account credentials against the identity store
pub struct CredentialStore {
    storage: SharedStorage,
}

impl CredentialStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Authenticate by email and password
    ///
    /// Unknown email and wrong password collapse into the same
    /// `InvalidCredentials` outcome so callers cannot enumerate accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = self
            .storage
            .identities()
            .identity_by_email(email)
            .await?
            .ok_or(SiteKeeperError::InvalidCredentials)?;

        if !verify_password(password, &identity.password_hash) {
            return Err(SiteKeeperError::InvalidCredentials);
        }

        Ok(identity)
    }

    /// Register a new account
    ///
    /// Email uniqueness is enforced by the store's atomic insert; a
    /// duplicate surfaces as `Conflict` even under concurrent registration.
    pub async fn register(
        &self,
        name: String,
        email: String,
        password: &str,
        role: Role,
    ) -> Result<Identity> {
        let password_hash = hash_password(password)?;
        let identity = Identity::new(name, email, password_hash, role);
        self.storage.identities().create_identity(identity).await
    }

    /// Replace an account's password after verifying the current one
    ///
    /// Outstanding session tokens remain valid; a client that wants forced
    /// re-login revokes its own token after the change.
    pub async fn change_password(
        &self,
        identity_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<Identity> {
        let mut identity = self
            .storage
            .identities()
            .identity_by_id(identity_id)
            .await?
            .ok_or(SiteKeeperError::Unauthenticated)?;

        if !verify_password(old_password, &identity.password_hash) {
            return Err(SiteKeeperError::InvalidCredentials);
        }

        identity.password_hash = hash_password(new_password)?;
        self.storage.identities().update_identity(identity.clone()).await?;
        Ok(identity)
    }
}
