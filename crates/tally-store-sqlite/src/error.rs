//! Error type for `tally-store-sqlite`.

use tally_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("invalid stored choice: {0}")]
  InvalidChoice(i64),

  /// An insert-if-absent found neither its own row nor the one it
  /// conflicted with.
  #[error("{0} row missing after insert-if-absent")]
  ConflictOnCreate(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl DomainError for Error {
  fn domain(&self) -> Option<&tally_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}
