//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Ids are SQLite rowids.

use chrono::{DateTime, Utc};
use urna_core::{admin::Admin, candidate::Candidate, vote::Vote};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

pub fn decode_count(column: &'static str, value: i64) -> Result<u64> {
  u64::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

pub fn decode_age(value: Option<i64>) -> Result<Option<u32>> {
  value
    .map(|v| u32::try_from(v).map_err(|_| Error::OutOfRange { column: "age", value: v }))
    .transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawCandidate::from_row`].
pub const CANDIDATE_COLUMNS: &str = "candidate_id, first_name, last_name, category, number, \
                                     age, bio, photo, published, created_at";

/// Raw values read directly from a `candidates` row.
pub struct RawCandidate {
  pub candidate_id: i64,
  pub first_name:   String,
  pub last_name:    String,
  pub category:     String,
  pub number:       String,
  pub age:          Option<i64>,
  pub bio:          String,
  pub photo:        Option<String>,
  pub published:    bool,
  pub created_at:   String,
}

impl RawCandidate {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      candidate_id: row.get(0)?,
      first_name:   row.get(1)?,
      last_name:    row.get(2)?,
      category:     row.get(3)?,
      number:       row.get(4)?,
      age:          row.get(5)?,
      bio:          row.get(6)?,
      photo:        row.get(7)?,
      published:    row.get(8)?,
      created_at:   row.get(9)?,
    })
  }

  pub fn into_candidate(self) -> Result<Candidate> {
    Ok(Candidate {
      candidate_id: self.candidate_id,
      first_name:   self.first_name,
      last_name:    self.last_name,
      category:     self.category,
      number:       self.number,
      age:          decode_age(self.age)?,
      bio:          self.bio,
      photo:        self.photo,
      published:    self.published,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawVote::from_row`].
pub const VOTE_COLUMNS: &str = "vote_id, candidate_id, voter_name, voter_meta, voter_token, \
                                voter_ip, voter_fp_hash, created_at";

/// Raw values read directly from a `votes` row.
pub struct RawVote {
  pub vote_id:       i64,
  pub candidate_id:  i64,
  pub voter_name:    String,
  pub voter_meta:    String,
  pub voter_token:   String,
  pub voter_ip:      String,
  pub voter_fp_hash: String,
  pub created_at:    String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:       row.get(0)?,
      candidate_id:  row.get(1)?,
      voter_name:    row.get(2)?,
      voter_meta:    row.get(3)?,
      voter_token:   row.get(4)?,
      voter_ip:      row.get(5)?,
      voter_fp_hash: row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      vote_id:       self.vote_id,
      candidate_id:  self.candidate_id,
      voter_name:    self.voter_name,
      voter_meta:    self.voter_meta,
      voter_token:   self.voter_token,
      voter_ip:      self.voter_ip,
      voter_fp_hash: self.voter_fp_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `admins` row.
pub struct RawAdmin {
  pub admin_id:      i64,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAdmin {
  pub fn into_admin(self) -> Result<Admin> {
    Ok(Admin {
      admin_id:      self.admin_id,
      username:      self.username,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
