//! User — a chat account known to Tally.

use serde::{Deserialize, Serialize};

use crate::ids::{CircleId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:        UserId,
  pub circle_id:      Option<CircleId>,
  /// External account identifier; unique across all users.
  pub tid:            i64,
  pub first_name:     String,
  pub last_name:      Option<String>,
  pub username:       Option<String>,
  /// Disabled users are invisible to every command.
  pub enabled:        bool,
  /// Stored but never consulted.
  pub default_choice: Option<i64>,
  /// Opted in to daily reminders.
  pub reminder:       bool,
  pub loud:           bool,
}

impl User {
  /// "First Last", falling back to the username and then to the account id.
  pub fn display_name(&self) -> String {
    let first = self.first_name.trim();
    let last = self.last_name.as_deref().map(str::trim).unwrap_or("");
    match (first.is_empty(), last.is_empty()) {
      (false, false) => format!("{first} {last}"),
      (false, true) => first.to_owned(),
      (true, false) => last.to_owned(),
      (true, true) => match self.username.as_deref() {
        Some(u) if !u.is_empty() => format!("@{u}"),
        _ => format!("#{}", self.tid),
      },
    }
  }
}

/// The identity an external transport reports for the sender of a message.
///
/// Used to auto-provision a [`User`] on first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  #[serde(rename = "id")]
  pub tid:        i64,
  #[serde(default)]
  pub first_name: String,
  #[serde(default)]
  pub last_name:  Option<String>,
  #[serde(default)]
  pub username:   Option<String>,
}
