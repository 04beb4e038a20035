//! Status aggregation for a circle's current phase.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
  circle::Circle,
  ledger::Ledger,
  phase::{self, Phase, PhaseMode},
  statement::{Choice, Statement},
  user::User,
};

/// A statement together with its author.
#[derive(Debug, Clone, Serialize)]
pub struct Vote {
  pub user:      User,
  pub statement: Statement,
}

impl Vote {
  /// e.g. `Ada Lovelace +2 (late, keep a plate)`.
  pub fn label(&self) -> String {
    let mut label = self.user.display_name();
    if let Some(Choice::Present { guests }) = self.statement.choice
      && guests > 0
    {
      label.push_str(&format!(" +{guests}"));
    }
    if let Some(comment) = &self.statement.comment {
      label.push_str(&format!(" ({comment})"));
    }
    label
  }
}

/// Who is coming to the current phase.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
  pub circle:    Circle,
  pub phase:     Phase,
  pub present:   Vec<Vote>,
  pub absent:    Vec<Vote>,
  /// Members with a statement but no choice (e.g. only a comment).
  pub undecided: Vec<Vote>,
  /// Enabled members with no statement at all.
  pub nonvoters: Vec<User>,
}

impl StatusReport {
  /// Sum of every decided choice: "present +2" counts three.
  ///
  /// Saturates rather than overflowing on absurd stored guest counts.
  pub fn known_total(&self) -> u64 {
    self
      .present
      .iter()
      .chain(&self.absent)
      .filter_map(|v| v.statement.choice)
      .map(Choice::headcount)
      .fold(0, u64::saturating_add)
  }
}

/// Resolve the current phase of `circle` at `at` (creating it if needed) and
/// partition its members by what they declared.
pub fn aggregate<L: Ledger>(
  ledger: &L,
  circle: &Circle,
  at: NaiveDateTime,
) -> Result<StatusReport, L::Error> {
  let phase =
    phase::resolve_or_create(ledger, circle.circle_id, at, PhaseMode::Current)?
      .into_inner();

  let mut present = Vec::new();
  let mut absent = Vec::new();
  let mut undecided = Vec::new();
  for (user, statement) in ledger.statements_for_phase(circle.circle_id, phase.phase_id)? {
    let bucket = match statement.choice {
      Some(Choice::Present { .. }) => &mut present,
      Some(Choice::Absent) => &mut absent,
      None => &mut undecided,
    };
    bucket.push(Vote { user, statement });
  }

  // A member who never touched the phase has no row to join against.
  let mut nonvoters = Vec::new();
  for member in ledger.members_of(circle.circle_id)? {
    if !member.enabled {
      continue;
    }
    if ledger.find_statement(member.user_id, phase.phase_id)?.is_none() {
      nonvoters.push(member);
    }
  }

  Ok(StatusReport {
    circle: circle.clone(),
    phase,
    present,
    absent,
    undecided,
    nonvoters,
  })
}
