//! Actor token verification.
//!
//! Tokens are minted by the external identity provider. The service only
//! verifies them and reads the actor id (`sub`) and role claims. HS256 with a
//! shared secret and RS256 with the provider's public key are supported.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Claims carried by an actor token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorClaims {
    /// Actor id assigned by the identity provider.
    pub sub: String,
    /// Role name (`student`, `committee` or `admin`).
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// JWT ID
    pub jti: String,
}

/// Verifies actor tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    algorithm: Algorithm,
    decoding_key: DecodingKey,
    /// Present only for HS256, where the same secret can sign test tokens.
    encoding_key: Option<EncodingKey>,
    pub leeway_secs: u64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

impl TokenVerifier {
    /// Creates an HS256 verifier from a shared secret.
    pub fn from_secret(secret: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("HS256 secret is empty".to_string()));
        }
        Ok(Self {
            algorithm: Algorithm::HS256,
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            leeway_secs,
        })
    }

    /// Creates an RS256 verifier from the identity provider's public key (PEM).
    pub fn from_rsa_public_key(public_key_pem: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;
        Ok(Self {
            algorithm: Algorithm::RS256,
            decoding_key,
            encoding_key: None,
            leeway_secs,
        })
    }

    /// Builds a verifier from configuration values.
    ///
    /// `algorithm` is `HS256` (uses `secret`) or `RS256` (uses `public_key`).
    pub fn from_parts(
        algorithm: &str,
        secret: &str,
        public_key: &str,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        match algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Self::from_secret(secret, leeway_secs),
            "RS256" => Self::from_rsa_public_key(public_key, leeway_secs),
            other => Err(JwtError::UnsupportedAlgorithm(other.to_string())),
        }
    }

    /// Validates a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<ActorClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        let token_data =
            decode::<ActorClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidToken
                    | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                    _ => JwtError::DecodingError(e.to_string()),
                }
            })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(JwtError::InvalidToken);
        }

        Ok(token_data.claims)
    }

    /// Signs a token for the given actor. Only available for HS256 verifiers;
    /// used by tests and local tooling that stand in for the identity provider.
    pub fn issue(
        &self,
        actor_id: &str,
        role: &str,
        expiry_secs: i64,
    ) -> Result<String, JwtError> {
        let encoding_key = self.encoding_key.as_ref().ok_or_else(|| {
            JwtError::EncodingError("RS256 verifier cannot sign tokens".to_string())
        })?;

        let now = Utc::now();
        let claims = ActorClaims {
            sub: actor_id.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(expiry_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(self.algorithm), &claims, encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }
}
