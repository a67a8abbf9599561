//! [`SqliteStore`], the SQLite implementation of [`BallotStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use urna_core::{
  admin::Admin,
  candidate::{Candidate, NewCandidate},
  store::BallotStore,
  vote::{NewVote, Vote, VoteOutcome},
};

use crate::{
  Result,
  encode::{
    CANDIDATE_COLUMNS, RawAdmin, RawCandidate, RawVote, VOTE_COLUMNS, decode_count,
    encode_dt,
  },
  schema::SCHEMA,
};

/// Matches any vote sharing the token, the fingerprint hash or the IP.
const DUPLICATE_QUERY: &str = "SELECT vote_id FROM votes
   WHERE voter_token = ?1 OR voter_fp_hash = ?2 OR voter_ip = ?3
   ORDER BY vote_id
   LIMIT 1";

/// What happened inside the vote transaction, before row decoding.
enum CastResult {
  Recorded(RawVote),
  Duplicate(Option<i64>),
  Unavailable,
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Urna ballot store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── BallotStore impl ────────────────────────────────────────────────────────

impl BallotStore for SqliteStore {
  type Error = crate::Error;

  // ── Candidates ────────────────────────────────────────────────────────────

  async fn add_candidate(&self, input: NewCandidate) -> Result<Candidate> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let row        = input.clone();

    let candidate_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO candidates (
             first_name, last_name, category, number, age, bio, photo,
             published, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
          rusqlite::params![
            row.first_name,
            row.last_name,
            row.category,
            row.number,
            row.age,
            row.bio,
            row.photo,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Candidate {
      candidate_id,
      first_name: input.first_name,
      last_name: input.last_name,
      category: input.category,
      number: input.number,
      age: input.age,
      bio: input.bio,
      photo: input.photo,
      published: false,
      created_at,
    })
  }

  async fn get_candidate(&self, id: i64) -> Result<Option<Candidate>> {
    let raw: Option<RawCandidate> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE candidate_id = ?1"),
            rusqlite::params![id],
            RawCandidate::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCandidate::into_candidate).transpose()
  }

  async fn list_candidates(&self, published: Option<bool>) -> Result<Vec<Candidate>> {
    let raws: Vec<RawCandidate> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(p) = published {
          let mut stmt = conn.prepare(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates
             WHERE published = ?1 ORDER BY candidate_id"
          ))?;
          stmt
            .query_map(rusqlite::params![p], RawCandidate::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY candidate_id"
          ))?;
          stmt
            .query_map([], RawCandidate::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCandidate::into_candidate).collect()
  }

  async fn publish(&self, ids: Vec<i64>) -> Result<usize> {
    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut changed = 0;
        {
          let mut stmt = tx.prepare(
            "UPDATE candidates SET published = 1
             WHERE candidate_id = ?1 AND published = 0",
          )?;
          for id in ids {
            changed += stmt.execute(rusqlite::params![id])?;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;
    Ok(changed)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn find_duplicate(
    &self,
    token:   String,
    ip:      String,
    fp_hash: String,
  ) -> Result<Option<i64>> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            DUPLICATE_QUERY,
            rusqlite::params![token, fp_hash, ip],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(found)
  }

  async fn cast_vote(&self, input: NewVote) -> Result<VoteOutcome> {
    let candidate_id = input.candidate_id();
    let name         = input.voter_name().to_owned();
    let meta         = input.voter_meta().to_owned();
    let fp           = input.fingerprint().clone();
    let at_str       = encode_dt(Utc::now());

    let result = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock up front so the duplicate check and
        // the insert see the same snapshot.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let published: Option<bool> = tx
          .query_row(
            "SELECT published FROM candidates WHERE candidate_id = ?1",
            rusqlite::params![candidate_id],
            |r| r.get(0),
          )
          .optional()?;
        if published != Some(true) {
          return Ok(CastResult::Unavailable);
        }

        let existing: Option<i64> = tx
          .query_row(
            DUPLICATE_QUERY,
            rusqlite::params![fp.token, fp.hash, fp.ip],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(vote_id) = existing {
          return Ok(CastResult::Duplicate(Some(vote_id)));
        }

        let inserted = tx.execute(
          "INSERT INTO votes (
             candidate_id, voter_name, voter_meta,
             voter_token, voter_ip, voter_fp_hash, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![candidate_id, name, meta, fp.token, fp.ip, fp.hash, at_str],
        );
        match inserted {
          Ok(_) => {}
          // Unreachable while the lookup above runs in this transaction; kept
          // for writers that bypass `cast_vote`.
          Err(e) if is_unique_violation(&e) => return Ok(CastResult::Duplicate(None)),
          Err(e) => return Err(e.into()),
        }

        let vote_id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(CastResult::Recorded(RawVote {
          vote_id,
          candidate_id,
          voter_name: name,
          voter_meta: meta,
          voter_token: fp.token,
          voter_ip: fp.ip,
          voter_fp_hash: fp.hash,
          created_at: at_str,
        }))
      })
      .await?;

    Ok(match result {
      CastResult::Recorded(raw) => VoteOutcome::Recorded(raw.into_vote()?),
      CastResult::Duplicate(conflicting_vote) => VoteOutcome::Duplicate { conflicting_vote },
      CastResult::Unavailable => VoteOutcome::CandidateUnavailable,
    })
  }

  async fn list_votes(&self) -> Result<Vec<Vote>> {
    let raws: Vec<RawVote> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {VOTE_COLUMNS} FROM votes ORDER BY vote_id"))?;
        let rows = stmt
          .query_map([], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  async fn vote_counts(&self) -> Result<Vec<(i64, u64)>> {
    let rows: Vec<(i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT candidate_id, COUNT(*) FROM votes
           GROUP BY candidate_id ORDER BY candidate_id",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, n)| Ok((id, decode_count("count", n)?)))
      .collect()
  }

  // ── Admins ────────────────────────────────────────────────────────────────

  async fn admin_exists(&self) -> Result<bool> {
    let exists = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT EXISTS (SELECT 1 FROM admins)", [], |r| r.get(0))?)
      })
      .await?;
    Ok(exists)
  }

  async fn create_first_admin(
    &self,
    username:      String,
    password_hash: String,
  ) -> Result<Option<Admin>> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let name       = username.clone();
    let hash       = password_hash.clone();

    let admin_id: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists: bool =
          tx.query_row("SELECT EXISTS (SELECT 1 FROM admins)", [], |r| r.get(0))?;
        if exists {
          return Ok(None);
        }
        tx.execute(
          "INSERT INTO admins (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, hash, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Some(id))
      })
      .await?;

    Ok(admin_id.map(|admin_id| Admin { admin_id, username, password_hash, created_at }))
  }

  async fn get_admin_by_username(&self, username: String) -> Result<Option<Admin>> {
    let raw: Option<RawAdmin> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT admin_id, username, password_hash, created_at
             FROM admins WHERE username = ?1",
            rusqlite::params![username],
            |row| {
              Ok(RawAdmin {
                admin_id:      row.get(0)?,
                username:      row.get(1)?,
                password_hash: row.get(2)?,
                created_at:    row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAdmin::into_admin).transpose()
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, token: String, admin_id: i64) -> Result<()> {
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token, admin_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![token, admin_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn session_admin(&self, token: String) -> Result<Option<i64>> {
    let admin_id = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT admin_id FROM sessions WHERE token = ?1",
            rusqlite::params![token],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;
    Ok(admin_id)
  }

  async fn delete_session(&self, token: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token = ?1", rusqlite::params![token])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
