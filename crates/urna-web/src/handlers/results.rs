//! Results, export and QR codes. Every handler requires an [`AdminSession`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/results` | Tally over published candidates |
//! | `GET`  | `/admin/export` | `votes_export.csv` attachment |
//! | `GET`  | `/admin/qr/{id}` | PNG linking to `/vote/{id}` |
//! | `GET`  | `/admin/qr-site` | PNG linking to the site root |

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use urna_core::{
  candidate::Candidate,
  export::votes_csv,
  store::BallotStore,
  tally::{self, Tally},
};

use crate::{AppState, auth::AdminSession, error::Error, qr};

/// `GET /admin/results`
pub async fn summary<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
) -> Result<Json<Tally>, Error>
where
  S: BallotStore + Clone + 'static,
{
  let candidates = state
    .store
    .list_candidates(Some(true))
    .await
    .map_err(Error::store)?;
  let counts: HashMap<i64, u64> = state
    .store
    .vote_counts()
    .await
    .map_err(Error::store)?
    .into_iter()
    .collect();

  Ok(Json(tally::tally(candidates, &counts)))
}

/// `GET /admin/export`
pub async fn export<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, Error>
where
  S: BallotStore + Clone + 'static,
{
  let votes = state.store.list_votes().await.map_err(Error::store)?;
  let candidates: HashMap<i64, Candidate> = state
    .store
    .list_candidates(None)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|c| (c.candidate_id, c))
    .collect();

  let csv = votes_csv(&votes, &candidates)?;
  tracing::info!(rows = votes.len(), "votes exported");

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
      (header::CONTENT_DISPOSITION, "attachment; filename=\"votes_export.csv\""),
    ],
    csv,
  ))
}

/// `GET /admin/qr/{id}`
pub async fn candidate_qr<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
  WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
) -> Result<impl IntoResponse, Error>
where
  S: BallotStore + Clone + 'static,
{
  let candidate = state
    .store
    .get_candidate(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("candidate {id} not found")))?;

  let png = qr::render_png(&qr::vote_url(&state.config.base_url, candidate.candidate_id))?;
  let disposition = format!(
    "attachment; filename=\"candidate_{}_qr.png\"",
    candidate.candidate_id
  );

  Ok((
    [
      (header::CONTENT_TYPE, "image/png".to_string()),
      (header::CONTENT_DISPOSITION, disposition),
    ],
    png,
  ))
}

/// `GET /admin/qr-site`
pub async fn site_qr<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
) -> Result<impl IntoResponse, Error>
where
  S: BallotStore + Clone + 'static,
{
  let png = qr::render_png(&state.config.base_url)?;
  Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
