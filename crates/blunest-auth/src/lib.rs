//! Authentication primitives for the BluNest marketplace
//!
//! - [`jwt`]: session tokens issued by the identity provider (HS256)
//! - [`signature`]: HMAC-SHA256 signatures on payment gateway webhooks

pub mod jwt;
pub mod signature;

pub use jwt::{JwtClaims, JwtError, JwtValidator, UserMetadata};
pub use signature::{sign_payload, verify_signature, SignatureError};
