//! Credential hashing and session token issuance.
//!
//! Both live behind traits so the user service never handles the primitives directly.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::SaltString,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::{dao::id::EntityId, error::ServiceError};

/// Hashes and verifies user passwords.
pub trait CredentialService: Send + Sync {
    /// Produce a salted hash in PHC string format.
    fn hash(&self, password: &str) -> Result<String, ServiceError>;
    /// Check `password` against a hash produced by [`CredentialService::hash`].
    fn verify(&self, password: &str, hash: &str) -> Result<bool, ServiceError>;
}

/// Issues session tokens for authenticated users.
pub trait TokenService: Send + Sync {
    /// Sign a token whose subject is `user_id`.
    fn issue(&self, user_id: &EntityId) -> Result<String, ServiceError>;
}

/// Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone)]
pub struct Argon2Credentials;

impl CredentialService for Argon2Credentials {
    fn hash(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|err| ServiceError::Internal(format!("failed to encode salt: {err}")))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| ServiceError::Internal(format!("failed to hash password: {err}")))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|err| ServiceError::Internal(format!("invalid password hash: {err}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Claims carried by session tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
}

/// HS256-signed JWTs.
pub struct JwtTokenService {
    key: EncodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    /// Tokens signed with `secret`, valid for `ttl` after issuance.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: &EntityId) -> Result<String, ServiceError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ServiceError::Internal(format!("system clock before epoch: {err}")))?
            .as_secs();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        encode(&Header::default(), &claims, &self.key)
            .map_err(|err| ServiceError::Internal(format!("failed to sign token: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{DecodingKey, Validation, decode};

    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let credentials = Argon2Credentials;
        let hash = credentials.hash("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(credentials.verify("hunter22", &hash).unwrap());
        assert!(!credentials.verify("hunter23", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt_each_time() {
        let credentials = Argon2Credentials;
        let first = credentials.hash("hunter22").unwrap();
        let second = credentials.hash("hunter22").unwrap();
        assert_ne!(first, second);
        assert!(credentials.verify("hunter22", &second).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_internal_error() {
        let err = Argon2Credentials.verify("pw", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
    }

    #[test]
    fn token_carries_user_id_and_expiry() {
        let service = JwtTokenService::new("secret", Duration::from_secs(3600));
        let user_id = EntityId::generate();
        let token = service.issue(&user_id).unwrap();

        let decoded = decode::<SessionClaims>(
            &token,
            &DecodingKey::from_secret(b"secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user_id.to_string());
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
    }
}
