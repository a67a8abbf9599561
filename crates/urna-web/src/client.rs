//! Client address and user agent, as seen by the vote handlers.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use urna_core::store::BallotStore;

use crate::AppState;

/// The raw inputs to a voter fingerprint, minus the token cookie.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
  pub ip:         Option<String>,
  pub user_agent: Option<String>,
}

/// First address of `X-Forwarded-For`, i.e. the original client.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
  headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(str::trim)
    .filter(|ip| !ip.is_empty())
    .map(str::to_string)
}

impl<S> FromRequestParts<AppState<S>> for ClientInfo
where
  S: BallotStore + Clone + 'static,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let ip = if state.config.trust_forwarded_for {
      forwarded_for(&parts.headers)
    } else {
      None
    }
    .or_else(|| {
      parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    let user_agent = parts
      .headers
      .get(header::USER_AGENT)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);

    Ok(ClientInfo { ip, user_agent })
  }
}
