//! Admin login, logout and one-time registration.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login` | Form: `username`, `password`; sets the session cookie |
//! | `POST` | `/logout` | Drops the session, if any |
//! | `POST` | `/admin/register` | Form: `username`, `password`; closed once an admin exists |

use axum::{
  Form, Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use axum_extra::extract::{
  WithRejection,
  cookie::{Cookie, CookieJar},
};
use serde::Deserialize;
use serde_json::{Value, json};
use urna_core::store::BallotStore;

use crate::{
  AppState,
  auth::{SESSION_COOKIE, hash_password, new_session_token, session_cookie, verify_password},
  error::Error,
};

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password: String,
}

/// `POST /login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
  WithRejection(Form(form), _): WithRejection<Form<CredentialsForm>, Error>,
) -> Result<(CookieJar, Json<Value>), Error>
where
  S: BallotStore + Clone + 'static,
{
  let username = form.username.trim().to_string();
  let admin = state
    .store
    .get_admin_by_username(username.clone())
    .await
    .map_err(Error::store)?
    .filter(|a| verify_password(&form.password, &a.password_hash));

  let Some(admin) = admin else {
    tracing::warn!(%username, "failed admin login");
    return Err(Error::InvalidCredentials);
  };

  let token = new_session_token();
  state
    .store
    .create_session(token.clone(), admin.admin_id)
    .await
    .map_err(Error::store)?;

  tracing::info!(username = %admin.username, "admin logged in");
  let jar = jar.add(session_cookie(token, state.config.secure_cookies));
  Ok((jar, Json(json!({ "message": "Logged in." }))))
}

/// `POST /logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), Error>
where
  S: BallotStore + Clone + 'static,
{
  if let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) {
    state
      .store
      .delete_session(token)
      .await
      .map_err(Error::store)?;
  }
  let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
  Ok((jar, Json(json!({ "message": "Logged out." }))))
}

/// `POST /admin/register`
///
/// Only succeeds while no administrator exists.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  WithRejection(Form(form), _): WithRejection<Form<CredentialsForm>, Error>,
) -> Result<impl IntoResponse, Error>
where
  S: BallotStore + Clone + 'static,
{
  if state.store.admin_exists().await.map_err(Error::store)? {
    return Err(Error::RegistrationClosed);
  }

  let username = form.username.trim();
  let password = form.password.trim();
  if username.is_empty() || password.is_empty() {
    return Err(Error::BadRequest("Fill in every field.".to_string()));
  }

  let hash = hash_password(password)?;
  let admin = state
    .store
    .create_first_admin(username.to_string(), hash)
    .await
    .map_err(Error::store)?
    .ok_or(Error::RegistrationClosed)?;

  tracing::info!(username = %admin.username, "first administrator registered");
  Ok((StatusCode::CREATED, Json(admin)))
}
