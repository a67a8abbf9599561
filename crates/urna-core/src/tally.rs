//! Tally computation over published candidates.
//!
//! Candidates are processed in ascending id order. The winner is the first
//! candidate to reach the maximum count, so ties go to the lowest id. With
//! zero votes cast the lowest-id candidate wins with a count of zero.

use std::collections::HashMap;

use serde::Serialize;

use crate::candidate::Candidate;

/// Count and share of one candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateResult {
  pub candidate:  Candidate,
  pub votes:      u64,
  /// Percentage of `Tally::total_votes`, rounded to two decimals.
  pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tally {
  pub results:     Vec<CandidateResult>,
  pub total_votes: u64,
  /// `None` only when there are no published candidates.
  pub winner:      Option<Candidate>,
}

/// Compute the tally. Unpublished candidates are skipped; votes for ids not
/// in `candidates` do not count toward the total.
pub fn tally(
  candidates: impl IntoIterator<Item = Candidate>,
  counts: &HashMap<i64, u64>,
) -> Tally {
  let mut published: Vec<Candidate> =
    candidates.into_iter().filter(|c| c.published).collect();
  published.sort_by_key(|c| c.candidate_id);

  let total_votes: u64 = published
    .iter()
    .map(|c| counts.get(&c.candidate_id).copied().unwrap_or(0))
    .sum();

  let mut winner: Option<(u64, &Candidate)> = None;
  for c in &published {
    let votes = counts.get(&c.candidate_id).copied().unwrap_or(0);
    if winner.is_none_or(|(best, _)| votes > best) {
      winner = Some((votes, c));
    }
  }
  let winner = winner.map(|(_, c)| c.clone());

  let results = published
    .into_iter()
    .map(|candidate| {
      let votes = counts.get(&candidate.candidate_id).copied().unwrap_or(0);
      CandidateResult { candidate, votes, percentage: percentage(votes, total_votes) }
    })
    .collect();

  Tally { results, total_votes, winner }
}

fn percentage(votes: u64, total: u64) -> f64 {
  if total == 0 {
    return 0.0;
  }
  let pct = votes as f64 / total as f64 * 100.0;
  (pct * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn candidate(id: i64, published: bool) -> Candidate {
    Candidate {
      candidate_id: id,
      first_name:   format!("C{id}"),
      last_name:    String::new(),
      category:     String::new(),
      number:       id.to_string(),
      age:          None,
      bio:          String::new(),
      photo:        None,
      published,
      created_at:   Utc::now(),
    }
  }

  fn counts(pairs: &[(i64, u64)]) -> HashMap<i64, u64> {
    pairs.iter().copied().collect()
  }

  #[test]
  fn three_to_one_split() {
    let t = tally(
      vec![candidate(1, true), candidate(2, true)],
      &counts(&[(1, 3), (2, 1)]),
    );
    assert_eq!(t.total_votes, 4);
    assert_eq!(t.results[0].percentage, 75.0);
    assert_eq!(t.results[1].percentage, 25.0);
    assert_eq!(t.winner.unwrap().candidate_id, 1);
  }

  #[test]
  fn zero_votes_gives_zero_percentages_and_lowest_id_winner() {
    let t = tally(
      vec![candidate(7, true), candidate(3, true), candidate(5, true)],
      &HashMap::new(),
    );
    assert_eq!(t.total_votes, 0);
    assert!(t.results.iter().all(|r| r.percentage == 0.0 && r.votes == 0));
    assert_eq!(t.winner.unwrap().candidate_id, 3);
  }

  #[test]
  fn tie_goes_to_lowest_id_regardless_of_input_order() {
    let t = tally(
      vec![candidate(9, true), candidate(4, true), candidate(6, true)],
      &counts(&[(9, 2), (4, 2), (6, 1)]),
    );
    assert_eq!(t.winner.unwrap().candidate_id, 4);
    let ids: Vec<i64> = t.results.iter().map(|r| r.candidate.candidate_id).collect();
    assert_eq!(ids, vec![4, 6, 9]);
  }

  #[test]
  fn later_strictly_greater_count_wins() {
    let t = tally(
      vec![candidate(1, true), candidate(2, true)],
      &counts(&[(1, 1), (2, 5)]),
    );
    assert_eq!(t.winner.unwrap().candidate_id, 2);
  }

  #[test]
  fn unpublished_candidates_are_excluded() {
    let t = tally(
      vec![candidate(1, true), candidate(2, false)],
      &counts(&[(1, 1), (2, 10)]),
    );
    assert_eq!(t.results.len(), 1);
    assert_eq!(t.total_votes, 1);
    assert_eq!(t.results[0].percentage, 100.0);
    assert_eq!(t.winner.unwrap().candidate_id, 1);
  }

  #[test]
  fn no_published_candidates_means_no_winner() {
    let t = tally(vec![candidate(1, false)], &counts(&[(1, 2)]));
    assert!(t.results.is_empty());
    assert!(t.winner.is_none());
    assert_eq!(t.total_votes, 0);
  }

  #[test]
  fn percentages_sum_to_one_hundred_within_rounding() {
    let t = tally(
      vec![candidate(1, true), candidate(2, true), candidate(3, true)],
      &counts(&[(1, 1), (2, 1), (3, 1)]),
    );
    let sum: f64 = t.results.iter().map(|r| r.percentage).sum();
    assert!((sum - 100.0).abs() < 0.05, "sum = {sum}");
    assert_eq!(t.results[0].percentage, 33.33);
  }
}
