//! Token issuance and password hashing
//!
//! Tokens are HS256 JWTs carrying the user id and role. The algorithm is
//! pinned on both encode and decode.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::models::RoleKind;

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: RoleKind,
    pub exp: i64,
    pub iat: i64,
}

/// A verified caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: RoleKind,
}

pub struct CredentialService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl CredentialService {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
    }

    pub fn with_ttl(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        }
    }

    pub fn issue_token(&self, user_id: Uuid, role: RoleKind) -> TrackerResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "JWT encoding failed");
            TrackerError::Unavailable("token issuance failed".to_string())
        })
    }

    pub fn verify_token(&self, token: &str) -> TrackerResult<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            TrackerError::InvalidToken
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| TrackerError::InvalidToken)?;
        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }

    pub fn hash_password(&self, password: &str) -> TrackerResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                TrackerError::Unavailable("password hashing failed".to_string())
            })
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> TrackerResult<()> {
        let parsed = PasswordHash::new(stored_hash).map_err(|_| TrackerError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| TrackerError::InvalidCredentials)
    }

    /// `hash_password` on the blocking pool, off the async workers.
    pub async fn hash_password_blocking(self: Arc<Self>, password: String) -> TrackerResult<String> {
        tokio::task::spawn_blocking(move || self.hash_password(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                TrackerError::Unavailable("password hashing failed".to_string())
            })?
    }

    /// `verify_password` on the blocking pool.
    pub async fn verify_password_blocking(
        self: Arc<Self>,
        password: String,
        stored_hash: String,
    ) -> TrackerResult<()> {
        tokio::task::spawn_blocking(move || self.verify_password(&password, &stored_hash))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password verification task failed");
                TrackerError::Unavailable("password verification failed".to_string())
            })?
    }
}
