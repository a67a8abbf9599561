//! Candidate management. Every handler requires an [`AdminSession`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/candidates` | All candidates, newest first |
//! | `POST` | `/admin/candidates` | Form: [`CandidateForm`]; created unpublished |
//! | `GET`  | `/admin/publish` | Candidates still unpublished |
//! | `POST` | `/admin/publish` | Form: repeated `candidate_ids` |

use axum::{
  Form, Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use urna_core::{
  candidate::{Candidate, NewCandidate},
  store::BallotStore,
};

use crate::{AppState, auth::AdminSession, error::Error};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /admin/candidates`
pub async fn list<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Candidate>>, Error>
where
  S: BallotStore + Clone + 'static,
{
  let mut candidates = state
    .store
    .list_candidates(None)
    .await
    .map_err(Error::store)?;
  candidates.reverse();
  Ok(Json(candidates))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// Raw form fields. Every field is optional text, as posted by an HTML form.
#[derive(Debug, Default, Deserialize)]
pub struct CandidateForm {
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default)]
  pub category:   String,
  #[serde(default)]
  pub number:     String,
  #[serde(default)]
  pub age:        String,
  #[serde(default)]
  pub bio:        String,
  #[serde(default)]
  pub photo:      String,
}

impl TryFrom<CandidateForm> for NewCandidate {
  type Error = Error;

  fn try_from(form: CandidateForm) -> Result<Self, Error> {
    let age = match form.age.trim() {
      "" => None,
      raw => Some(
        raw
          .parse::<u32>()
          .map_err(|_| Error::BadRequest(format!("invalid age: {raw:?}")))?,
      ),
    };
    let photo = Some(form.photo.trim().to_string()).filter(|p| !p.is_empty());

    Ok(NewCandidate {
      first_name: form.first_name.trim().to_string(),
      last_name: form.last_name.trim().to_string(),
      category: form.category.trim().to_string(),
      number: form.number.trim().to_string(),
      age,
      bio: form.bio,
      photo,
    })
  }
}

/// `POST /admin/candidates`
pub async fn create<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
  WithRejection(Form(form), _): WithRejection<Form<CandidateForm>, Error>,
) -> Result<impl IntoResponse, Error>
where
  S: BallotStore + Clone + 'static,
{
  let input = NewCandidate::try_from(form)?;
  let candidate = state
    .store
    .add_candidate(input)
    .await
    .map_err(Error::store)?;

  tracing::info!(
    candidate_id = candidate.candidate_id,
    name = %candidate.full_name(),
    "candidate added (unpublished)"
  );
  Ok((StatusCode::CREATED, Json(candidate)))
}

// ─── Publication ──────────────────────────────────────────────────────────────

/// `GET /admin/publish`
pub async fn drafts<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Candidate>>, Error>
where
  S: BallotStore + Clone + 'static,
{
  let drafts = state
    .store
    .list_candidates(Some(false))
    .await
    .map_err(Error::store)?;
  Ok(Json(drafts))
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishForm {
  #[serde(default)]
  pub candidate_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct PublishSummary {
  /// Candidates whose flag actually flipped; already-published ones are
  /// not counted.
  pub published: usize,
}

/// `POST /admin/publish`
///
/// Uses the `axum-extra` form extractor so that `candidate_ids=1&candidate_ids=2`
/// collects into a list.
pub async fn publish<S>(
  _session: AdminSession,
  State(state): State<AppState<S>>,
  WithRejection(axum_extra::extract::Form(form), _): WithRejection<
    axum_extra::extract::Form<PublishForm>,
    Error,
  >,
) -> Result<Json<PublishSummary>, Error>
where
  S: BallotStore + Clone + 'static,
{
  let requested = form.candidate_ids.len();
  let published = state
    .store
    .publish(form.candidate_ids)
    .await
    .map_err(Error::store)?;

  tracing::info!(requested, published, "candidates published");
  Ok(Json(PublishSummary { published }))
}
