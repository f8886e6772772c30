//! Webhook signature verification
//!
//! The payment gateway signs each webhook body with HMAC-SHA256 using the
//! shared webhook secret and sends the lowercase hex digest in a header.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing signature")]
    Missing,

    #[error("Signature is not valid hex")]
    Malformed,

    #[error("Signature mismatch")]
    Mismatch,

    #[error("Webhook secret is empty")]
    EmptySecret,
}

/// Hex-encoded HMAC-SHA256 of `payload`
pub fn sign_payload(secret: &[u8], payload: &[u8]) -> Result<String, SignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex signature against `payload` in constant time
pub fn verify_signature(
    secret: &[u8],
    payload: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;
    let expected = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;

    let mut mac = new_mac(secret)?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

fn new_mac(secret: &[u8]) -> Result<HmacSha256, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::EmptySecret);
    }
    HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::EmptySecret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"whsec_test";
    const BODY: &[u8] = br#"{"event":"subscription.activated"}"#;

    #[test]
    fn test_sign_and_verify() {
        let signature = sign_payload(SECRET, BODY).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_signature(SECRET, BODY, Some(&signature)).is_ok());
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_payload(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_tampered_body() {
        let signature = sign_payload(SECRET, BODY).unwrap();
        let result = verify_signature(SECRET, br#"{"event":"subscription.cancelled"}"#, Some(&signature));
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_missing_and_malformed() {
        assert_eq!(
            verify_signature(SECRET, BODY, None),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, Some("  ")),
            Err(SignatureError::Missing)
        );
        assert_eq!(
            verify_signature(SECRET, BODY, Some("not-hex")),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_truncated_signature() {
        let signature = sign_payload(SECRET, BODY).unwrap();
        let result = verify_signature(SECRET, BODY, Some(&signature[..32]));
        assert_eq!(result, Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_empty_secret() {
        assert_eq!(sign_payload(b"", BODY), Err(SignatureError::EmptySecret));
    }
}
