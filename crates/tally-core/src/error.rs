//! Error types for `tally-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::ids::CircleId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user is disabled")]
  UserDisabled,

  #[error("user is not a member of any circle")]
  NoCircle,

  #[error("circle not found: {0:?}")]
  CircleNotFound(String),

  #[error("circle {0:?} cannot be joined")]
  CircleNotJoinable(String),

  #[error("circle {0:?} requires a join code")]
  MissingJoinCode(String),

  #[error("invalid join code for circle {0:?}")]
  InvalidJoinCode(String),

  #[error("circle {0} has no moments configured")]
  NoMomentsConfigured(CircleId),

  #[error("date {0} has no representable neighbour")]
  DateOutOfRange(NaiveDate),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Access to the domain error carried by a backend error, if any.
///
/// Backends wrap [`Error`] in their own error type; the command layer uses this
/// to tell user-facing conditions apart from infrastructure failures.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}
