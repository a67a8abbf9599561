//! Candidates and their publication state.
//!
//! A candidate starts life as an unpublished draft visible only to admins.
//! Publishing is one-way: there is no unpublish operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
  pub candidate_id: i64,
  pub first_name:   String,
  pub last_name:    String,
  /// Field of study, department, list name, etc.
  pub category:     String,
  /// Free-form display number shown on ballots and posters.
  pub number:       String,
  pub age:          Option<u32>,
  pub bio:          String,
  /// Reference to a photo hosted elsewhere (file name or URL).
  pub photo:        Option<String>,
  pub published:    bool,
  pub created_at:   DateTime<Utc>,
}

impl Candidate {
  /// `"First Last"`, trimmed so a missing half does not leave a stray space.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_string()
  }
}

/// Input to [`crate::store::BallotStore::add_candidate`].
/// New candidates are always unpublished; `created_at` is set by the store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCandidate {
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  String,
  #[serde(default)]
  pub category:   String,
  #[serde(default)]
  pub number:     String,
  #[serde(default)]
  pub age:        Option<u32>,
  #[serde(default)]
  pub bio:        String,
  #[serde(default)]
  pub photo:      Option<String>,
}

impl NewCandidate {
  /// Convenience constructor with only the name filled in.
  pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      ..Self::default()
    }
  }
}
