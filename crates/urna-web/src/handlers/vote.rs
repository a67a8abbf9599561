//! Voter-facing endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/vote` | Published candidates, ascending id |
//! | `GET`  | `/vote/{id}` | 404 unless published; reports whether this client already voted |
//! | `POST` | `/vote/{id}` | Form: `voter_name`, `voter_meta` |

use axum::{
  Form, Json,
  extract::{Path, State},
};
use axum_extra::extract::{
  WithRejection,
  cookie::{Cookie, CookieJar, SameSite},
};
use serde::{Deserialize, Serialize};
use urna_core::{
  candidate::Candidate,
  fingerprint::{Fingerprint, TOKEN_COOKIE, TOKEN_MAX_AGE_DAYS},
  store::BallotStore,
  vote::{NewVote, VoteOutcome},
};

use crate::{AppState, client::ClientInfo, error::Error};

async fn published_candidate<S>(state: &AppState<S>, id: i64) -> Result<Candidate, Error>
where
  S: BallotStore + Clone + 'static,
{
  state
    .store
    .get_candidate(id)
    .await
    .map_err(Error::store)?
    .filter(|c| c.published)
    .ok_or_else(|| Error::NotFound(format!("candidate {id} not found")))
}

fn fingerprint_for(jar: &CookieJar, client: &ClientInfo) -> Fingerprint {
  Fingerprint::derive(
    jar.get(TOKEN_COOKIE).map(Cookie::value),
    client.ip.as_deref(),
    client.user_agent.as_deref(),
  )
}

fn token_cookie(token: String, secure: bool) -> Cookie<'static> {
  Cookie::build((TOKEN_COOKIE, token))
    .path("/")
    .max_age(time::Duration::days(TOKEN_MAX_AGE_DAYS))
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .build()
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /vote`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Candidate>>, Error>
where
  S: BallotStore + Clone + 'static,
{
  let candidates = state
    .store
    .list_candidates(Some(true))
    .await
    .map_err(Error::store)?;
  Ok(Json(candidates))
}

// ─── Show ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BallotView {
  pub candidate:     Candidate,
  /// `true` when this browser, device or address has already voted, so the
  /// form can be disabled up front.
  pub already_voted: bool,
}

/// `GET /vote/{id}`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
  jar: CookieJar,
  client: ClientInfo,
) -> Result<Json<BallotView>, Error>
where
  S: BallotStore + Clone + 'static,
{
  let candidate = published_candidate(&state, id).await?;

  let fp = fingerprint_for(&jar, &client);
  let already_voted = state
    .store
    .find_duplicate(fp.token, fp.ip, fp.hash)
    .await
    .map_err(Error::store)?
    .is_some();

  Ok(Json(BallotView { candidate, already_voted }))
}

// ─── Cast ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VoteForm {
  #[serde(default)]
  pub voter_name: String,
  #[serde(default)]
  pub voter_meta: String,
}

#[derive(Debug, Serialize)]
pub struct VoteReceipt {
  pub message:   &'static str,
  pub vote_id:   i64,
  pub candidate: Candidate,
}

/// `POST /vote/{id}`
///
/// On success the voter token cookie is (re)issued for another year.
pub async fn cast<S>(
  State(state): State<AppState<S>>,
  WithRejection(Path(id), _): WithRejection<Path<i64>, Error>,
  jar: CookieJar,
  client: ClientInfo,
  WithRejection(Form(form), _): WithRejection<Form<VoteForm>, Error>,
) -> Result<(CookieJar, Json<VoteReceipt>), Error>
where
  S: BallotStore + Clone + 'static,
{
  let candidate = published_candidate(&state, id).await?;

  let fp = fingerprint_for(&jar, &client);
  let token = fp.token.clone();
  let ballot = NewVote::new(candidate.candidate_id, &form.voter_name, &form.voter_meta, fp)?;

  match state.store.cast_vote(ballot).await.map_err(Error::store)? {
    VoteOutcome::Recorded(vote) => {
      tracing::info!(
        vote_id = vote.vote_id,
        candidate_id = vote.candidate_id,
        "vote recorded"
      );
      let jar = jar.add(token_cookie(token, state.config.secure_cookies));
      Ok((jar, Json(VoteReceipt {
        message: "Thank you, your vote has been recorded.",
        vote_id: vote.vote_id,
        candidate,
      })))
    }
    VoteOutcome::Duplicate { conflicting_vote } => {
      tracing::warn!(candidate_id = id, ?conflicting_vote, "duplicate vote rejected");
      Err(Error::DuplicateVote)
    }
    VoteOutcome::CandidateUnavailable => {
      Err(Error::NotFound(format!("candidate {id} not found")))
    }
  }
}
