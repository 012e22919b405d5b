//! HMAC-SHA256 primitives for token signatures
//!
//! Signatures are raw 32-byte digests; callers handle base64url framing.
//! Verification goes through `Mac::verify_slice`, which compares in
//! constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use super::TokenError;

/// HMAC type alias for SHA-256
type HmacSha256 = Hmac<Sha256>;

/// Shared symmetric secret used to sign and verify tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::Signing("secret key must not be empty".to_string()));
        }
        Ok(Self(secret.into_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**redacted**)")
    }
}

fn keyed_mac(key: &SecretKey) -> Result<HmacSha256, TokenError> {
    HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| TokenError::Signing(e.to_string()))
}

/// Compute the HMAC-SHA256 digest of `input`.
pub fn sign(input: &[u8], key: &SecretKey) -> Result<Vec<u8>, TokenError> {
    let mut mac = keyed_mac(key)?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Check `signature` against the digest of `input`.
pub fn verify(input: &[u8], signature: &[u8], key: &SecretKey) -> Result<(), TokenError> {
    let mut mac = keyed_mac(key).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(input);
    mac.verify_slice(signature)
        .map_err(|_| TokenError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(secret: &str) -> SecretKey {
        SecretKey::new(secret).unwrap()
    }

    #[test]
    fn test_sign_verify() {
        let input = b"header.payload";
        let signature = sign(input, &key("secret_password_123")).unwrap();

        // SHA256 produces 32 bytes
        assert_eq!(signature.len(), 32);

        assert!(verify(input, &signature, &key("secret_password_123")).is_ok());
        assert!(verify(input, &signature, &key("wrong_password")).is_err());
        assert!(verify(b"header.payload2", &signature, &key("secret_password_123")).is_err());
    }

    #[test]
    fn test_sign_deterministic() {
        let a = sign(b"same data", &key("same_password")).unwrap();
        let b = sign(b"same data", &key("same_password")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncated_signature_rejected() {
        let k = key("secret");
        let signature = sign(b"data", &k).unwrap();
        assert!(matches!(
            verify(b"data", &signature[..31], &k),
            Err(TokenError::InvalidSignature)
        ));
        assert!(verify(b"data", &[], &k).is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(SecretKey::new(""), Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", key("super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
    }
}
