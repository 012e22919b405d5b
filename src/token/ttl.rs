//! Token lifetime parsing.
//!
//! A TTL is a non-negative integer followed by exactly one unit character:
//! `s` (seconds), `m` (minutes) or `h` (hours). Examples: `45s`, `30m`, `1h`.

use chrono::TimeDelta;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::TokenError;

/// Lifetime added to the issuance instant to compute `exp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Ttl(TimeDelta);

impl Ttl {
    pub fn from_seconds(seconds: i64) -> Option<Self> {
        TimeDelta::try_seconds(seconds)
            .filter(|d| *d >= TimeDelta::zero())
            .map(Self)
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    pub fn as_seconds(&self) -> i64 {
        self.0.num_seconds()
    }
}

impl FromStr for Ttl {
    type Err = TokenError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || TokenError::InvalidTtlFormat(raw.to_string());

        let (split, unit) = raw.char_indices().last().ok_or_else(invalid)?;
        let digits = &raw[..split];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let multiplier: i64 = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            _ => return Err(invalid()),
        };

        let value: i64 = digits.parse().map_err(|_| invalid())?;
        value
            .checked_mul(multiplier)
            .and_then(Ttl::from_seconds)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Ttl {
    type Error = TokenError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.as_seconds())
    }
}
