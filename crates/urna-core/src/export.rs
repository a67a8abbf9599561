//! CSV export of every recorded vote.

use std::collections::HashMap;

use crate::{Result, candidate::Candidate, vote::Vote};

pub const CSV_HEADER: [&str; 4] = ["Candidate", "Voter", "Voter Info", "Vote Date"];

/// Timestamp layout used in the `Vote Date` column (UTC).
pub const VOTE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `votes` as CSV, one row per vote in the order given. Votes whose
/// candidate is missing from `candidates` get `N/A` in the first column.
pub fn votes_csv(votes: &[Vote], candidates: &HashMap<i64, Candidate>) -> Result<Vec<u8>> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  writer.write_record(CSV_HEADER)?;

  for vote in votes {
    let candidate = candidates
      .get(&vote.candidate_id)
      .map(Candidate::full_name)
      .unwrap_or_else(|| "N/A".to_string());
    let date = vote.created_at.format(VOTE_DATE_FORMAT).to_string();
    writer.write_record([
      candidate.as_str(),
      vote.voter_name.as_str(),
      vote.voter_meta.as_str(),
      date.as_str(),
    ])?;
  }

  writer.flush()?;
  writer
    .into_inner()
    .map_err(|e| csv::Error::from(e.into_error()).into())
}
