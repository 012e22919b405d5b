//! Compact bearer tokens
//!
//! Tokens are three base64url (unpadded) segments joined by `.`:
//!
//! ```text
//! base64url({"alg":"HS256","typ":"JWT"}) . base64url(claims + exp) . base64url(HMAC-SHA256)
//! ```
//!
//! The signature covers the exact bytes `header-segment.payload-segment`.
//! `exp` is stored as whole seconds since the Unix epoch; a token is expired
//! once the clock reads strictly later than that instant.
//!
//! Verification never looks at the payload before the signature has been
//! confirmed.

pub mod clock;
pub mod crypto;
pub mod ttl;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::SecretKey;
pub use ttl::Ttl;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

const DELIMITER: char = '.';

/// Claim holding the absolute expiry instant (Unix seconds).
pub const EXPIRY_CLAIM: &str = "exp";

/// Claims consulted, in order, for the principal identifier.
pub const PRINCIPAL_CLAIMS: [&str; 2] = ["userId", "sub"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is not three non-empty segments")]
    MalformedToken,

    #[error("signature does not match")]
    InvalidSignature,

    #[error("payload is not a base64url JSON object")]
    MalformedPayload,

    #[error("token has expired")]
    Expired,

    #[error("invalid ttl format: {0:?}")]
    InvalidTtlFormat(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

// =============================================================================
// Claims
// =============================================================================

/// Authenticated identity asserted by a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// String-keyed JSON assertions embedded in a token payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims carrying only a `userId`.
    pub fn for_principal(principal: &Principal) -> Self {
        Self::new().with(PRINCIPAL_CLAIMS[0], principal.as_str())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// First usable principal claim. Strings must be non-empty; integers are
    /// rendered in decimal.
    pub fn principal(&self) -> Option<Principal> {
        PRINCIPAL_CLAIMS.iter().find_map(|key| match self.0.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(Principal::new(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Principal::new(n.to_string())),
            _ => None,
        })
    }

    /// Expiry in whole Unix seconds, if present and integral.
    pub fn expires_at(&self) -> Option<i64> {
        self.0.get(EXPIRY_CLAIM).and_then(Value::as_i64)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// =============================================================================
// Encoding and verification
// =============================================================================

#[derive(Serialize)]
struct Header {
    alg: &'static str,
    typ: &'static str,
}

const HEADER: Header = Header {
    alg: "HS256",
    typ: "JWT",
};

fn encode_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Sign `claims` with an `exp` of `now + ttl`.
///
/// The caller's claims are copied; any `exp` they carry is overwritten in the
/// copy. The TTL is parsed before any cryptographic work.
pub fn issue_at(
    claims: &Claims,
    key: &SecretKey,
    ttl: &str,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    issue_signed_by(claims, ttl, now, |input| crypto::sign(input, key))
}

pub fn issue_with_ttl(
    claims: &Claims,
    key: &SecretKey,
    ttl: Ttl,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    encode_signed(claims, ttl, now, |input| crypto::sign(input, key))
}

/// `issue_at` with the MAC supplied by the caller. `sign` only runs once the
/// TTL has parsed.
fn issue_signed_by<F>(claims: &Claims, ttl: &str, now: DateTime<Utc>, sign: F) -> Result<String, TokenError>
where
    F: FnOnce(&[u8]) -> Result<Vec<u8>, TokenError>,
{
    let ttl: Ttl = ttl.parse()?;
    encode_signed(claims, ttl, now, sign)
}

fn encode_signed<F>(claims: &Claims, ttl: Ttl, now: DateTime<Utc>, sign: F) -> Result<String, TokenError>
where
    F: FnOnce(&[u8]) -> Result<Vec<u8>, TokenError>,
{
    let expiry = now
        .checked_add_signed(ttl.as_delta())
        .ok_or_else(|| TokenError::Signing("expiry out of range".to_string()))?;
    let payload = claims.clone().with(EXPIRY_CLAIM, expiry.timestamp());

    let signing_input = format!("{}{DELIMITER}{}", encode_json(&HEADER)?, encode_json(&payload)?);
    let signature = sign(signing_input.as_bytes())?;

    Ok(format!(
        "{signing_input}{DELIMITER}{}",
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Parse and verify `token` as of `now`.
///
/// Checks run in order and stop at the first failure: shape, signature,
/// payload decoding, expiry.
pub fn verify_at(token: &str, key: &SecretKey, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let mut segments = token.split(DELIMITER);
    let (header, payload, signature) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(h), Some(p), Some(s), None) if !h.is_empty() && !p.is_empty() && !s.is_empty() => {
            (h, p, s)
        }
        _ => return Err(TokenError::MalformedToken),
    };

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::InvalidSignature)?;
    let signing_input = &token[..header.len() + 1 + payload.len()];
    crypto::verify(signing_input.as_bytes(), &signature, key)?;

    let claims = decode_payload(payload)?;

    if let Some(exp) = claims.get(EXPIRY_CLAIM) {
        if is_past(exp, now)? {
            return Err(TokenError::Expired);
        }
    }

    Ok(claims)
}

fn decode_payload(segment: &str) -> Result<Claims, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::MalformedPayload)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(Claims(map)),
        _ => Err(TokenError::MalformedPayload),
    }
}

fn is_past(exp: &Value, now: DateTime<Utc>) -> Result<bool, TokenError> {
    let now_ms = now.timestamp_millis();
    match exp {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                Ok(now_ms > secs.saturating_mul(1_000))
            } else if let Some(secs) = n.as_f64() {
                Ok(now_ms as f64 > secs * 1_000.0)
            } else {
                Err(TokenError::MalformedPayload)
            }
        }
        _ => Err(TokenError::MalformedPayload),
    }
}

// =============================================================================
// Codec with a bound key and clock
// =============================================================================

/// Anything that can turn a bearer token into verified claims.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, TokenError>;
}

/// Issues and verifies tokens with one secret and one time source.
#[derive(Clone)]
pub struct TokenCodec {
    key: SecretKey,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(key: SecretKey) -> Self {
        Self::with_clock(key, Arc::new(SystemClock))
    }

    pub fn with_clock(key: SecretKey, clock: Arc<dyn Clock>) -> Self {
        Self { key, clock }
    }

    pub fn issue(&self, claims: &Claims, ttl: &str) -> Result<String, TokenError> {
        issue_at(claims, &self.key, ttl, self.clock.now())
    }

    pub fn issue_for(&self, claims: &Claims, ttl: Ttl) -> Result<String, TokenError> {
        issue_with_ttl(claims, &self.key, ttl, self.clock.now())
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        verify_at(token, &self.key, self.clock.now())
    }
}

impl TokenVerifier for TokenCodec {
    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        TokenCodec::verify(self, token)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").field("key", &self.key).finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
