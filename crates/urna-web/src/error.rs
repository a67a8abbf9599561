//! Error types and axum `IntoResponse` implementation.

use std::fmt::Display;

use axum::{
  Json,
  extract::rejection::{FormRejection, PathRejection},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An admin route was hit without a valid session.
  #[error("login required")]
  Unauthorized,
  /// Unknown user and wrong password share this variant.
  #[error("incorrect username or password")]
  InvalidCredentials,
  #[error("an administrator already exists")]
  RegistrationClosed,
  #[error("already voted")]
  DuplicateVote,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error(transparent)]
  Core(#[from] urna_core::Error),
  #[error("password hashing error: {0}")]
  PasswordHash(String),
  #[error("qr code error: {0}")]
  Qr(String),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  /// An extractor refused the request; keeps the extractor's status code.
  #[error("{message}")]
  Rejected { status: StatusCode, message: String },
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  fn rejected<R: IntoResponse + Display>(rejection: R) -> Self {
    let message = rejection.to_string();
    let status = rejection.into_response().status();
    Self::Rejected { status, message }
  }
}

/// Path segments are only ever ids, so a malformed one names nothing.
impl From<PathRejection> for Error {
  fn from(rejection: PathRejection) -> Self {
    Self::NotFound(rejection.body_text())
  }
}

impl From<FormRejection> for Error {
  fn from(rejection: FormRejection) -> Self { Self::rejected(rejection) }
}

impl From<axum_extra::extract::FormRejection> for Error {
  fn from(rejection: axum_extra::extract::FormRejection) -> Self {
    Self::rejected(rejection)
  }
}

fn body(status: StatusCode, message: impl Into<String>) -> Response {
  (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        body(StatusCode::UNAUTHORIZED, "You must be logged in to access this page.")
      }
      Error::InvalidCredentials => {
        body(StatusCode::UNAUTHORIZED, "Incorrect username or password.")
      }
      Error::RegistrationClosed => {
        let mut res = body(
          StatusCode::SEE_OTHER,
          "An administrator already exists. Registration is disabled.",
        );
        res
          .headers_mut()
          .insert(header::LOCATION, header::HeaderValue::from_static("/login"));
        res
      }
      Error::DuplicateVote => body(
        StatusCode::CONFLICT,
        "You have already voted, or this device has already been used to vote.",
      ),
      Error::NotFound(msg) => body(StatusCode::NOT_FOUND, msg),
      Error::BadRequest(msg) => body(StatusCode::BAD_REQUEST, msg),
      Error::Rejected { status, message } => body(status, message),
      Error::Core(urna_core::Error::MissingVoterName) => {
        body(StatusCode::BAD_REQUEST, "Please enter your name.")
      }
      Error::Core(e) => {
        tracing::error!(error = %e, "core error");
        body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      Error::PasswordHash(msg) | Error::Qr(msg) => {
        tracing::error!(error = %msg, "internal error");
        body(StatusCode::INTERNAL_SERVER_ERROR, msg)
      }
      Error::Store(e) => {
        tracing::error!(error = %e, "store error");
        body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    }
  }
}
