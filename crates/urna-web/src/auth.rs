//! Admin authentication: argon2 password hashes and cookie sessions.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use rand_core::{OsRng, RngCore};
use urna_core::store::BallotStore;

use crate::{AppState, error::Error};

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "urna_session";

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| Error::PasswordHash(e.to_string()))
}

/// `false` for a wrong password and for an unparseable stored hash alike.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// 32 random bytes, base64url without padding.
pub fn new_session_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  B64.encode(bytes)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
  Cookie::build((SESSION_COOKIE, token))
    .path("/")
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .build()
}

/// Present in a handler's arguments means the request carried a live admin
/// session.
pub struct AdminSession {
  pub admin_id: i64,
  pub token:    String,
}

impl<S> FromRequestParts<AppState<S>> for AdminSession
where
  S: BallotStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let jar = CookieJar::from_headers(&parts.headers);
    let token = jar
      .get(SESSION_COOKIE)
      .map(|c| c.value().to_owned())
      .filter(|t| !t.is_empty())
      .ok_or(Error::Unauthorized)?;

    let admin_id = state
      .store
      .session_admin(token.clone())
      .await
      .map_err(Error::store)?
      .ok_or(Error::Unauthorized)?;

    Ok(AdminSession { admin_id, token })
  }
}
