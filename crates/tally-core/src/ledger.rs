//! The `Ledger` trait — one open unit of work against the store.
//!
//! A ledger value represents a single transaction. Storage backends (e.g.
//! `tally-store-sqlite`) hand one to a closure, commit when the closure returns
//! `Ok`, and roll back otherwise. The resolver, statement, status, membership
//! and reminder modules are written against this trait, never against a
//! concrete backend.
//!
//! Methods are synchronous: they run inside the backend's transaction scope.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  DomainError,
  circle::Circle,
  ids::{CircleId, MomentId, PhaseId, UserId},
  moment::Moment,
  phase::Phase,
  statement::Statement,
  user::{Profile, User},
};

// ─── Upsert result ───────────────────────────────────────────────────────────

/// Outcome of an insert-if-absent operation, tagged with whether the row was
/// created by this call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "row", rename_all = "snake_case")]
pub enum Upserted<T> {
  Created(T),
  Existing(T),
}

impl<T> Upserted<T> {
  pub fn was_created(&self) -> bool { matches!(self, Self::Created(_)) }

  pub fn get(&self) -> &T {
    match self {
      Self::Created(v) | Self::Existing(v) => v,
    }
  }

  pub fn into_inner(self) -> T {
    match self {
      Self::Created(v) | Self::Existing(v) => v,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Upserted<U> {
    match self {
      Self::Created(v) => Upserted::Created(f(v)),
      Self::Existing(v) => Upserted::Existing(f(v)),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over one transaction of a Tally store backend.
///
/// Every `*_or_insert` / `touch_*` method is an atomic "insert if absent, else
/// return existing" guarded by a uniqueness constraint: two units of work
/// racing on the same key never produce two rows.
pub trait Ledger {
  type Error: std::error::Error
    + From<crate::Error>
    + DomainError
    + Send
    + Sync
    + 'static;

  // ── Circles & moments ─────────────────────────────────────────────────

  fn circle(&self, id: CircleId) -> Result<Option<Circle>, Self::Error>;

  fn circle_by_name(&self, name: &str) -> Result<Option<Circle>, Self::Error>;

  /// All moments of `circle`, ordered by time of day ascending.
  fn moments_of(&self, circle: CircleId) -> Result<Vec<Moment>, Self::Error>;

  fn moment(&self, id: MomentId) -> Result<Option<Moment>, Self::Error>;

  /// All members of `circle`, enabled or not, ordered by user id.
  fn members_of(&self, circle: CircleId) -> Result<Vec<User>, Self::Error>;

  // ── Users ─────────────────────────────────────────────────────────────

  fn user_by_tid(&self, tid: i64) -> Result<Option<User>, Self::Error>;

  /// Return the user with `profile.tid`, creating an enabled user with no
  /// circle if none exists. Existing users are returned unchanged.
  fn provision_user(&self, profile: &Profile) -> Result<Upserted<User>, Self::Error>;

  fn set_user_circle(
    &self,
    user: UserId,
    circle: Option<CircleId>,
  ) -> Result<(), Self::Error>;

  // ── Phases ────────────────────────────────────────────────────────────

  /// Look up the phase of `moment` on `date` without creating it.
  fn find_phase(
    &self,
    date: NaiveDate,
    moment: &Moment,
  ) -> Result<Option<Phase>, Self::Error>;

  /// Look up the phase of `moment` on `date`, creating it if absent.
  fn phase_or_insert(
    &self,
    date: NaiveDate,
    moment: &Moment,
  ) -> Result<Upserted<Phase>, Self::Error>;

  // ── Statements ────────────────────────────────────────────────────────

  /// Look up the statement of `user` for `phase` without creating it.
  fn find_statement(
    &self,
    user: UserId,
    phase: PhaseId,
  ) -> Result<Option<Statement>, Self::Error>;

  /// Return the statement of `user` for `phase`, creating an undecided one if
  /// absent. In both cases its `time` is set to `at`.
  fn touch_statement(
    &self,
    user: UserId,
    phase: PhaseId,
    at: NaiveDateTime,
  ) -> Result<Upserted<Statement>, Self::Error>;

  /// Persist `choice`, `comment` and `time` of an existing statement.
  fn update_statement(&self, statement: &Statement) -> Result<(), Self::Error>;

  /// Statements for `phase` made by enabled members of `circle`, paired with
  /// their authors, in the order they were last touched.
  fn statements_for_phase(
    &self,
    circle: CircleId,
    phase: PhaseId,
  ) -> Result<Vec<(User, Statement)>, Self::Error>;
}
