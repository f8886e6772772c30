//! JWT (JSON Web Token) handling
//!
//! Access tokens come from the external identity provider and are signed with
//! a shared HS256 secret. The claim layout follows GoTrue: `sub` is the user
//! id, `role` is the provider role (`authenticated`), and profile fields live
//! under `user_metadata`. Application roles are not trusted from the token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Audience the identity provider stamps on user sessions
pub const DEFAULT_AUDIENCE: &str = "authenticated";

/// Profile data the provider stores alongside the account
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// JWT claims for a user session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JwtClaims {
    /// Subject (user id)
    pub sub: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Audience
    #[serde(default)]
    pub aud: String,
    /// Account email
    #[serde(default)]
    pub email: Option<String>,
    /// Provider role, not the application role
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl JwtClaims {
    pub fn new(user_id: Uuid, email: impl Into<String>, validity: Duration) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            aud: DEFAULT_AUDIENCE.to_string(),
            email: Some(email.into()),
            role: Some(DEFAULT_AUDIENCE.to_string()),
            user_metadata: UserMetadata::default(),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.user_metadata.full_name = Some(full_name.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.user_metadata.phone = Some(phone.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.aud = audience.into();
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Subject parsed as a user id
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        Uuid::parse_str(&self.sub).map_err(|_| JwtError::InvalidSubject(self.sub.clone()))
    }
}

/// JWT errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// JWT validator
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    /// Create a validator for HS256 tokens signed with the provider's secret
    ///
    /// Validates the signature and expiration. Audience is only checked when
    /// [`JwtValidator::with_audience`] is called.
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.validate_nbf = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    _ => JwtError::InvalidToken,
                }
            })?;

        if token_data.claims.is_expired() {
            return Err(JwtError::TokenExpired);
        }

        Ok(token_data.claims)
    }

    /// Encode JWT using HMAC-SHA256 (symmetric secret)
    pub fn encode(secret: &[u8], claims: &JwtClaims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(secret);

        Ok(encode(&header, claims, &encoding_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    #[test]
    fn test_jwt_encode_decode() {
        let user_id = Uuid::new_v4();
        let claims = JwtClaims::new(user_id, "asha@example.com", Duration::hours(1))
            .with_full_name("Asha Rao");

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();

        let validator = JwtValidator::new(TEST_SECRET).with_audience(DEFAULT_AUDIENCE);
        let decoded = validator.validate(&token).unwrap();

        assert_eq!(decoded.user_id().unwrap(), user_id);
        assert_eq!(decoded.email.as_deref(), Some("asha@example.com"));
        assert_eq!(decoded.user_metadata.full_name.as_deref(), Some("Asha Rao"));
    }

    #[test]
    fn test_expired_token() {
        let claims = JwtClaims::new(Uuid::new_v4(), "old@example.com", Duration::hours(-2));
        assert!(claims.is_expired());

        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();
        let result = JwtValidator::new(TEST_SECRET).validate(&token);

        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let claims = JwtClaims::new(Uuid::new_v4(), "a@example.com", Duration::hours(1));
        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();

        let result = JwtValidator::new(b"another-secret").validate(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_audience_mismatch() {
        let claims = JwtClaims::new(Uuid::new_v4(), "a@example.com", Duration::hours(1))
            .with_audience("service_role");
        let token = JwtValidator::encode(TEST_SECRET, &claims).unwrap();

        assert!(JwtValidator::new(TEST_SECRET).validate(&token).is_ok());
        assert!(JwtValidator::new(TEST_SECRET)
            .with_audience(DEFAULT_AUDIENCE)
            .validate(&token)
            .is_err());
    }

    #[test]
    fn test_non_uuid_subject() {
        let mut claims = JwtClaims::new(Uuid::new_v4(), "a@example.com", Duration::hours(1));
        claims.sub = "anonymous".to_string();

        assert!(matches!(
            claims.user_id(),
            Err(JwtError::InvalidSubject(s)) if s == "anonymous"
        ));
    }

    #[test]
    fn test_provider_token_without_metadata() {
        // Minimal token shape as issued by the identity provider
        let now = Utc::now().timestamp();
        let raw = serde_json::json!({
            "sub": Uuid::new_v4().to_string(),
            "iat": now,
            "exp": now + 3600,
            "aud": "authenticated",
            "role": "authenticated",
            "email": "raw@example.com"
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &raw,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        let decoded = JwtValidator::new(TEST_SECRET).validate(&token).unwrap();
        assert_eq!(decoded.user_metadata, UserMetadata::default());
    }
}
