//! Voter identity derivation.
//!
//! A voter is recognised by three signals: a long-lived browser token kept in
//! a cookie, the client IP, and a SHA-256 fingerprint over
//! `token|ip|user_agent`. None of them is strong on its own; the duplicate
//! guard rejects a vote when any of them matches a previous one.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Name of the cookie carrying the voter token.
pub const TOKEN_COOKIE: &str = "voter_token";

/// Lifetime of the voter token cookie, in days.
pub const TOKEN_MAX_AGE_DAYS: i64 = 365;

/// The identity triple recorded alongside a vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
  pub token:       String,
  pub ip:          String,
  /// Lowercase hex SHA-256 of `token|ip|user_agent`.
  pub hash:        String,
  /// `true` when no usable token was presented and a new one was minted.
  /// The caller must send it back to the client.
  pub fresh_token: bool,
}

impl Fingerprint {
  /// Derive the identity for a request.
  ///
  /// An existing non-empty token is reused; otherwise a random UUID v4 is
  /// generated. Missing IP or user agent degrade to the empty string.
  pub fn derive(
    existing_token: Option<&str>,
    ip: Option<&str>,
    user_agent: Option<&str>,
  ) -> Self {
    let (token, fresh_token) = match existing_token.map(str::trim) {
      Some(t) if !t.is_empty() => (t.to_string(), false),
      _ => (Uuid::new_v4().to_string(), true),
    };
    let ip = ip.unwrap_or_default().to_string();
    let hash = fingerprint_hash(&token, &ip, user_agent.unwrap_or_default());

    Self { token, ip, hash, fresh_token }
  }
}

/// Deterministic digest over the identity triple.
pub fn fingerprint_hash(token: &str, ip: &str, user_agent: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(token.as_bytes());
  hasher.update(b"|");
  hasher.update(ip.as_bytes());
  hasher.update(b"|");
  hasher.update(user_agent.as_bytes());
  hex::encode(hasher.finalize())
}
