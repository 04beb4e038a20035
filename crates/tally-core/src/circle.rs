//! Circle — a group of users sharing a recurring schedule.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, ids::CircleId};

/// A persisted circle. Moments and members point at it by [`CircleId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Circle {
  pub circle_id:   CircleId,
  pub name:        String,
  /// Closed circles reject every join attempt, code or not.
  pub can_join:    bool,
  pub join_code:   Option<String>,
  /// Freeform note appended to status reports.
  pub bottom_line: Option<String>,
}

impl Circle {
  /// Check whether `code` grants membership.
  ///
  /// A closed circle always refuses. An open circle with a code set requires
  /// the exact code; an open circle without one admits anybody.
  pub fn authorize_join(&self, code: Option<&str>) -> Result<()> {
    if !self.can_join {
      return Err(Error::CircleNotJoinable(self.name.clone()));
    }
    match (self.join_code.as_deref(), code) {
      (None, _) => Ok(()),
      (Some(_), None) => Err(Error::MissingJoinCode(self.name.clone())),
      (Some(expected), Some(given)) if expected == given => Ok(()),
      (Some(_), Some(_)) => Err(Error::InvalidJoinCode(self.name.clone())),
    }
  }
}

/// Input for administratively creating a circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCircle {
  pub name:        String,
  pub can_join:    bool,
  pub join_code:   Option<String>,
  pub bottom_line: Option<String>,
}

impl NewCircle {
  /// An open circle with no join code and no bottom line.
  pub fn open(name: impl Into<String>) -> Self {
    Self {
      name:        name.into(),
      can_join:    true,
      join_code:   None,
      bottom_line: None,
    }
  }
}
