//! Error types for `urna-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("voter name must not be empty")]
  MissingVoterName,

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
