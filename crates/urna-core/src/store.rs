//! The `BallotStore` trait.
//!
//! Implemented by storage backends (e.g. `urna-store-sqlite`). The web layer
//! depends on this abstraction and receives a handle to it through its
//! application state.

use std::future::Future;

use crate::{
  admin::Admin,
  candidate::{Candidate, NewCandidate},
  vote::{NewVote, Vote, VoteOutcome},
};

/// Abstraction over an Urna storage backend.
///
/// Votes are append-only. Candidates only change through publication, which
/// is one-way.
pub trait BallotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Candidates ────────────────────────────────────────────────────────

  /// Persist a new, unpublished candidate.
  fn add_candidate(
    &self,
    input: NewCandidate,
  ) -> impl Future<Output = Result<Candidate, Self::Error>> + Send + '_;

  fn get_candidate(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Candidate>, Self::Error>> + Send + '_;

  /// List candidates in ascending id order, optionally filtered on the
  /// publication flag.
  fn list_candidates(
    &self,
    published: Option<bool>,
  ) -> impl Future<Output = Result<Vec<Candidate>, Self::Error>> + Send + '_;

  /// Mark every candidate in `ids` as published. Unknown ids are ignored.
  /// Returns how many candidates changed state, so a repeat call returns 0.
  fn publish(
    &self,
    ids: Vec<i64>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Return the id of any vote sharing the token, IP or fingerprint hash,
  /// regardless of which candidate it went to.
  fn find_duplicate(
    &self,
    token: String,
    ip: String,
    fp_hash: String,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Check for duplicates and insert in a single transaction.
  ///
  /// Duplicates and unpublished candidates are reported through
  /// [`VoteOutcome`], not as errors.
  fn cast_vote(
    &self,
    input: NewVote,
  ) -> impl Future<Output = Result<VoteOutcome, Self::Error>> + Send + '_;

  /// All votes in ascending creation order.
  fn list_votes(&self) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  /// `(candidate_id, count)` for every candidate with at least one vote.
  fn vote_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(i64, u64)>, Self::Error>> + Send + '_;

  // ── Admins ────────────────────────────────────────────────────────────

  fn admin_exists(&self) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Create the first administrator. Returns `None` without writing
  /// anything if an administrator already exists.
  fn create_first_admin(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + '_;

  fn get_admin_by_username(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Store an opaque session token for `admin_id`.
  fn create_session(
    &self,
    token: String,
    admin_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a session token to its administrator id.
  fn session_admin(
    &self,
    token: String,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  fn delete_session(
    &self,
    token: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
