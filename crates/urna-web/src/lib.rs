//! HTTP surface for Urna.
//!
//! Exposes an axum [`Router`] backed by any [`BallotStore`]. Responses are
//! JSON; voter and login requests are form-encoded so a plain HTML form can
//! post to them.

pub mod auth;
pub mod client;
pub mod error;
pub mod handlers;
pub mod qr;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderName, HeaderValue, header},
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use urna_core::store::BallotStore;

use handlers::{admin, results, session, vote};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `URNA_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  /// Public URL of the site, used to build QR code links.
  pub base_url:            String,
  pub store_path:          PathBuf,
  /// Mark cookies `Secure`. Turn on when served over HTTPS.
  #[serde(default)]
  pub secure_cookies:      bool,
  /// Take the client IP from `X-Forwarded-For`. Only safe behind a proxy
  /// that overwrites the header.
  #[serde(default)]
  pub trust_forwarded_for: bool,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BallotStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Browser hardening headers added to every response that does not already
/// carry them. HSTS only goes out when cookies are marked `Secure`, i.e. the
/// site is served over HTTPS.
fn with_security_headers<T>(router: Router<T>, hsts: bool) -> Router<T>
where
  T: Clone + Send + Sync + 'static,
{
  let fixed: [(HeaderName, &'static str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
  ];
  let router = fixed.into_iter().fold(router, |router, (name, value)| {
    router.layer(SetResponseHeaderLayer::if_not_present(
      name,
      HeaderValue::from_static(value),
    ))
  });

  if !hsts {
    return router;
  }
  router.layer(SetResponseHeaderLayer::if_not_present(
    header::STRICT_TRANSPORT_SECURITY,
    HeaderValue::from_static("max-age=31536000; includeSubDomains"),
  ))
}

/// Build the axum [`Router`] for the whole site.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BallotStore + Clone + 'static,
{
  let hsts = state.config.secure_cookies;
  let routes = Router::new()
    .route("/health",            get(|| async { "ok" }))
    // Voters
    .route("/vote",              get(vote::list::<S>))
    .route("/vote/{id}",         get(vote::show::<S>).post(vote::cast::<S>))
    // Sessions
    .route("/login",             post(session::login::<S>))
    .route("/logout",            post(session::logout::<S>))
    .route("/admin/register",    post(session::register::<S>))
    // Administration
    .route("/admin/candidates",  get(admin::list::<S>).post(admin::create::<S>))
    .route("/admin/publish",     get(admin::drafts::<S>).post(admin::publish::<S>))
    .route("/admin/results",     get(results::summary::<S>))
    .route("/admin/export",      get(results::export::<S>))
    .route("/admin/qr/{id}",     get(results::candidate_qr::<S>))
    .route("/admin/qr-site",     get(results::site_qr::<S>));

  with_security_headers(routes, hsts)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
