//! Votes. Immutable once written.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Error, Result, fingerprint::Fingerprint};

/// A recorded vote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vote {
  pub vote_id:       i64,
  pub candidate_id:  i64,
  pub voter_name:    String,
  pub voter_meta:    String,
  #[serde(skip_serializing)]
  pub voter_token:   String,
  #[serde(skip_serializing)]
  pub voter_ip:      String,
  #[serde(skip_serializing)]
  pub voter_fp_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::BallotStore::cast_vote`].
///
/// Construction goes through [`NewVote::new`], which guarantees a non-empty
/// voter name.
#[derive(Debug, Clone)]
pub struct NewVote {
  candidate_id: i64,
  voter_name:   String,
  voter_meta:   String,
  fingerprint:  Fingerprint,
}

impl NewVote {
  /// Validate and normalise a ballot. Name and metadata are trimmed.
  pub fn new(
    candidate_id: i64,
    voter_name: &str,
    voter_meta: &str,
    fingerprint: Fingerprint,
  ) -> Result<Self> {
    let voter_name = voter_name.trim();
    if voter_name.is_empty() {
      return Err(Error::MissingVoterName);
    }
    Ok(Self {
      candidate_id,
      voter_name: voter_name.to_string(),
      voter_meta: voter_meta.trim().to_string(),
      fingerprint,
    })
  }

  pub fn candidate_id(&self) -> i64 { self.candidate_id }

  pub fn voter_name(&self) -> &str { &self.voter_name }

  pub fn voter_meta(&self) -> &str { &self.voter_meta }

  pub fn fingerprint(&self) -> &Fingerprint { &self.fingerprint }
}

/// Result of an attempt to record a vote.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
  Recorded(Vote),
  /// The token, fingerprint hash or IP already voted. `conflicting_vote` is
  /// `None` when the rejection came from a unique index rather than the
  /// lookup.
  Duplicate { conflicting_vote: Option<i64> },
  /// The candidate does not exist or is not published.
  CandidateUnavailable,
}
