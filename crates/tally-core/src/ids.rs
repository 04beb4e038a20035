//! Row identifiers.
//!
//! Every table uses an integer primary key; each gets its own newtype so a
//! phase id can never be passed where a user id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! row_id {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
    }
  };
}

row_id!(
  /// Primary key of a row in `circles`.
  CircleId
);
row_id!(
  /// Primary key of a row in `moments`.
  MomentId
);
row_id!(
  /// Primary key of a row in `phases`.
  PhaseId
);
row_id!(
  /// Primary key of a row in `users`. Distinct from the external `tid`.
  UserId
);
row_id!(
  /// Primary key of a row in `statements`.
  StatementId
);
