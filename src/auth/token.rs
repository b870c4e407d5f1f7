use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::identity::Identity;
use crate::error::{Result, SiteKeeperError};
use crate::storage::revocation::SharedRevocationStore;

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: Uuid,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
    /// Issued at (as UTC timestamp)
    pub iat: usize,
}

impl Claims {
    /// Creates new claims for an account with the given lifetime
    pub fn new(subject: Uuid, ttl_secs: u64) -> Self {
        let now = Utc::now().timestamp() as usize;
        Self {
            sub: subject,
            exp: now + ttl_secs as usize,
            iat: now,
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() as usize >= self.exp
    }
}

/// Manages the session token lifecycle: issue, verify, revoke
///
/// Tokens are self-contained signed claims; validity is derived from the
/// signature and expiry plus a revocation-set membership check, so no
/// store round trip is needed for the cryptographic part.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
    revocations: SharedRevocationStore,
}

impl TokenService {
    /// Creates a new token service with a signing secret and token lifetime
    pub fn new(secret: &str, ttl_secs: u64, revocations: SharedRevocationStore) -> Self {
        let mut validation = Validation::default();
        // No clock leeway: an expired token is expired
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
            revocations,
        }
    }

    /// Lifetime of issued tokens, in seconds
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issues a signed session token bound to the given identity
    pub fn issue(&self, identity: &Identity) -> Result<String> {
        let claims = Claims::new(identity.id, self.ttl_secs);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SiteKeeperError::AuthError(format!("Failed to sign token: {}", e)))
    }

    /// Validates a token and returns its claims
    ///
    /// Returns `None` when the signature is invalid, the token has expired,
    /// the token has been revoked, or the input cannot be parsed at all.
    /// Malformed input never propagates an error to the caller.
    pub async fn verify(&self, token: &str) -> Option<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).ok()?;

        match self.revocations.is_revoked(token).await {
            Ok(false) => Some(data.claims),
            Ok(true) => None,
            Err(e) => {
                // Fail closed: an unreachable revocation store must not let
                // revoked tokens through
                log::warn!("Revocation lookup failed, rejecting token: {}", e);
                None
            }
        }
    }

    /// Revokes a token before its natural expiry
    ///
    /// Idempotent: revoking an already-revoked, expired, or unparseable
    /// token is a no-op.
    pub async fn revoke(&self, token: &str) {
        // Decode without expiry validation so a token at the edge of its
        // lifetime can still be pulled from circulation
        let mut lenient = self.validation.clone();
        lenient.validate_exp = false;

        let claims = match decode::<Claims>(token, &self.decoding_key, &lenient) {
            Ok(data) => data.claims,
            Err(_) => return, // nothing valid to revoke
        };

        let expires_at = match DateTime::<Utc>::from_timestamp(claims.exp as i64, 0) {
            Some(ts) => ts,
            None => return,
        };
        if expires_at <= Utc::now() {
            // Natural expiry already rejects this token; keeping it out of
            // the revocation set bounds the set to pre-expiry revocations
            return;
        }

        if let Err(e) = self.revocations.insert(token, expires_at).await {
            log::warn!("Failed to record token revocation: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{Identity, Role};
    use crate::storage::revocation::create_memory_revocation_store;

    const SECRET: &str = "unit-test-signing-key-0123456789abcdef";

    fn service(ttl_secs: u64) -> TokenService {
        TokenService::new(SECRET, ttl_secs, create_memory_revocation_store())
    }

    fn identity() -> Identity {
        Identity::new(
            "Alice".to_string(),
            "alice@example.com".to_string(),
            "irrelevant".to_string(),
            Role::Editor,
        )
    }

    #[tokio::test]
    async fn test_issue_then_verify_round_trip() {
        let service = service(3600);
        let alice = identity();

        let token = service.issue(&alice).unwrap();
        let claims = service.verify(&token).await.expect("fresh token must verify");
        assert_eq!(claims.sub, alice.id);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let service = service(3600);
        assert!(service.verify("not-a-token").await.is_none());
        assert!(service.verify("").await.is_none());
        assert!(service.verify("a.b.c").await.is_none());
    }

    #[tokio::test]
    async fn test_verify_rejects_foreign_signature() {
        let service = service(3600);
        let other = TokenService::new(
            "a-different-signing-key-0123456789abcdef",
            3600,
            create_memory_revocation_store(),
        );

        let token = other.issue(&identity()).unwrap();
        assert!(service.verify(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_revoked_token_fails_verification() {
        let service = service(3600);
        let token = service.issue(&identity()).unwrap();

        service.revoke(&token).await;
        assert!(service.verify(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let service = service(3600);
        let token = service.issue(&identity()).unwrap();

        service.revoke(&token).await;
        service.revoke(&token).await;
        assert!(service.verify(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_revoke_unparseable_token_is_noop() {
        let service = service(3600);
        service.revoke("garbage").await;
        // Still able to issue and verify normally afterwards
        let token = service.issue(&identity()).unwrap();
        assert!(service.verify(&token).await.is_some());
    }
}
