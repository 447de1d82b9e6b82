//! # JWT Token Management
//!
//! Issues and validates bearer tokens for users of auth-enabled
//! collections. Validation is stateless; resolving the token back to a
//! live user document is the HTTP layer's job.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};
use super::user::User;

/// Claims carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User document id
    pub sub: String,

    pub email: String,

    /// Auth collection that issued the token
    pub collection: String,

    pub iat: i64,

    /// Unix seconds
    pub exp: i64,

    pub iss: String,
}

/// Signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 secret
    pub secret: String,

    pub token_ttl: Duration,

    pub issuer: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: Duration::hours(2),
            issuer: "quire".to_string(),
        }
    }
}

/// Signed token plus its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub exp: i64,
}

/// Signs and checks bearer tokens
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Sign a token for `user`, valid for the configured TTL
    pub fn generate_token(&self, user: &User) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let exp = (now + self.config.token_ttl).timestamp();

        let claims = JwtClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            collection: user.collection.clone(),
            iat: now.timestamp(),
            exp,
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)?;

        Ok(IssuedToken { token, exp })
    }

    /// Verify signature, issuer and expiry, returning the claims
    pub fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        Ok(token_data.claims)
    }
}
