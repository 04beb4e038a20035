//! Statements — one user's declaration for one phase.
//!
//! Two access modes exist and are kept apart at call sites:
//!
//! - [`find_current`] is read-only: it never creates a phase or a statement.
//! - [`get_or_create`] / [`for_update`] create the statement on first access
//!   and stamp its `time` on every access, whether or not anything else
//!   changes afterwards.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  ids::{PhaseId, StatementId, UserId},
  ledger::{Ledger, Upserted},
  phase::{self, Phase, PhaseMode},
  user::User,
};

// ─── Choice ──────────────────────────────────────────────────────────────────

/// A decided attendance choice. Undecided is `Option::<Choice>::None`.
///
/// Stored as an integer: `0` is absent, `n >= 1` is present with `n - 1`
/// extra guests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Choice {
  Absent,
  Present { guests: u32 },
}

impl Choice {
  pub const ALONE: Self = Self::Present { guests: 0 };

  /// Decode the stored integer. Negative values are not a choice.
  pub fn from_raw(raw: i64) -> Option<Self> {
    match raw {
      0 => Some(Self::Absent),
      n if n > 0 => u32::try_from(n - 1)
        .ok()
        .map(|guests| Self::Present { guests }),
      _ => None,
    }
  }

  pub fn to_raw(self) -> i64 {
    match self {
      Self::Absent => 0,
      Self::Present { guests } => i64::from(guests) + 1,
    }
  }

  /// Number of people this choice accounts for.
  pub fn headcount(self) -> u64 {
    match self {
      Self::Absent => 0,
      Self::Present { guests } => u64::from(guests) + 1,
    }
  }
}

// ─── Statement ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
  pub statement_id: StatementId,
  pub user_id:      UserId,
  pub phase_id:     PhaseId,
  /// Last time the user touched this statement.
  pub time:         NaiveDateTime,
  pub comment:      Option<String>,
  pub choice:       Option<Choice>,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// The statement `user` made for the phase current at `at`, if any.
///
/// Read-only: neither the phase nor the statement is created.
pub fn find_current<L: Ledger>(
  ledger: &L,
  user: &User,
  at: NaiveDateTime,
) -> Result<Option<Statement>, L::Error> {
  let circle = user.circle_id.ok_or(Error::NoCircle)?;
  match phase::find(ledger, circle, at, PhaseMode::Current)? {
    Some(phase) => ledger.find_statement(user.user_id, phase.phase_id),
    None => Ok(None),
  }
}

/// The statement of `user` for `phase`, created undecided if absent, with its
/// `time` stamped to `at`.
pub fn get_or_create<L: Ledger>(
  ledger: &L,
  user: &User,
  phase: &Phase,
  at: NaiveDateTime,
) -> Result<Upserted<Statement>, L::Error> {
  ledger.touch_statement(user.user_id, phase.phase_id, at)
}

/// Resolve the phase addressed by `mode` for the user's circle, then get or
/// create the user's statement for it.
pub fn for_update<L: Ledger>(
  ledger: &L,
  user: &User,
  at: NaiveDateTime,
  mode: PhaseMode,
) -> Result<(Phase, Upserted<Statement>), L::Error> {
  let circle = user.circle_id.ok_or(Error::NoCircle)?;
  let phase = phase::resolve_or_create(ledger, circle, at, mode)?.into_inner();
  let statement = get_or_create(ledger, user, &phase, at)?;
  Ok((phase, statement))
}

/// Record `choice` for the phase addressed by `mode`.
pub fn declare<L: Ledger>(
  ledger: &L,
  user: &User,
  at: NaiveDateTime,
  mode: PhaseMode,
  choice: Choice,
) -> Result<(Phase, Statement), L::Error> {
  let (phase, statement) = for_update(ledger, user, at, mode)?;
  let mut statement = statement.into_inner();
  statement.choice = Some(choice);
  ledger.update_statement(&statement)?;
  Ok((phase, statement))
}

/// Attach `text` as the comment of the current phase's statement, leaving the
/// choice as it is.
pub fn comment<L: Ledger>(
  ledger: &L,
  user: &User,
  at: NaiveDateTime,
  text: &str,
) -> Result<(Phase, Statement), L::Error> {
  let (phase, statement) = for_update(ledger, user, at, PhaseMode::Current)?;
  let mut statement = statement.into_inner();
  statement.comment = Some(text.to_owned());
  ledger.update_statement(&statement)?;
  Ok((phase, statement))
}
