//! Command-line surface: run the server, or mint and inspect tokens with the
//! configured secret.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::token::{Claims, Principal, TokenCodec, Ttl};

#[derive(Debug, Parser)]
#[command(name = "gallery-gate", version, about = "Authenticated image gallery API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,

    /// Issue a signed token for a user
    IssueToken {
        /// Value of the `userId` claim
        #[arg(short, long)]
        user: String,

        /// Lifetime such as 30s, 15m or 1h (defaults to TOKEN_TTL)
        #[arg(short, long)]
        ttl: Option<Ttl>,

        /// Extra claim as key=value; JSON values are kept typed
        #[arg(short, long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, Value)>,
    },

    /// Verify a token and print its claims
    VerifyToken {
        token: String,
    },
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}

fn parse_claim(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("claim name is empty in {raw:?}"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn issue_token(
    codec: &TokenCodec,
    user: &str,
    ttl: Ttl,
    extra: &[(String, Value)],
) -> Result<String> {
    let mut claims = Claims::for_principal(&Principal::new(user));
    for (key, value) in extra {
        claims.insert(key.clone(), value.clone());
    }
    codec
        .issue_for(&claims, ttl)
        .context("failed to issue token")
}

/// Pretty-printed claims of a valid token.
pub fn verify_token(codec: &TokenCodec, token: &str) -> Result<String> {
    let claims = codec.verify(token.trim()).context("token rejected")?;
    Ok(serde_json::to_string_pretty(claims.as_map())?)
}
