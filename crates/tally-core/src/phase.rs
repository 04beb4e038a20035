//! Phase resolution — mapping a wall-clock instant to one dated occurrence of
//! a circle's moment.
//!
//! A circle's moments partition every day. The moment whose time of day was
//! reached most recently is *current*; the one reached next is *next*. Before
//! the first moment of a day, the current phase is still the previous day's
//! last moment; after the last moment, the next phase is the following day's
//! first moment.
//!
//! Phases are memoised: the first resolution landing on a `(date, moment)`
//! pair inserts the row, later ones return it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  ids::{CircleId, PhaseId},
  ledger::{Ledger, Upserted},
  moment::Moment,
};

/// Which occurrence relative to an instant is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseMode {
  Current,
  Next,
}

/// A materialised occurrence of a moment on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
  pub phase_id: PhaseId,
  pub date:     NaiveDate,
  pub moment:   Moment,
}

impl Phase {
  /// e.g. `dinner 16/10/2026`.
  pub fn label(&self) -> String {
    format!("{} {}", self.moment.name, self.date.format("%d/%m/%Y"))
  }
}

/// An unmaterialised `(date, moment)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
  pub date:   NaiveDate,
  pub moment: &'a Moment,
}

/// Find the slot addressed by `mode` at `at` among `moments`.
///
/// `moments` must be sorted by time of day, as returned by
/// [`Ledger::moments_of`].
pub fn locate<'a>(
  circle: CircleId,
  moments: &'a [Moment],
  at: NaiveDateTime,
  mode: PhaseMode,
) -> Result<Slot<'a>> {
  debug_assert!(moments.is_sorted_by_key(|m| m.time));

  let (first, last) = match (moments.first(), moments.last()) {
    (Some(first), Some(last)) => (first, last),
    _ => return Err(Error::NoMomentsConfigured(circle)),
  };
  let time = at.time();
  let date = at.date();

  match mode {
    PhaseMode::Current => match moments.iter().rev().find(|m| m.time <= time) {
      Some(moment) => Ok(Slot { date, moment }),
      None => {
        let date = date.pred_opt().ok_or(Error::DateOutOfRange(date))?;
        Ok(Slot { date, moment: last })
      }
    },
    PhaseMode::Next => match moments.iter().find(|m| m.time > time) {
      Some(moment) => Ok(Slot { date, moment }),
      None => {
        let date = date.succ_opt().ok_or(Error::DateOutOfRange(date))?;
        Ok(Slot { date, moment: first })
      }
    },
  }
}

/// Resolve the phase addressed by `mode` at `at`, creating it if this is the
/// first resolution to land on it.
pub fn resolve_or_create<L: Ledger>(
  ledger: &L,
  circle: CircleId,
  at: NaiveDateTime,
  mode: PhaseMode,
) -> Result<Upserted<Phase>, L::Error> {
  let moments = ledger.moments_of(circle)?;
  let slot = locate(circle, &moments, at, mode)?;
  ledger.phase_or_insert(slot.date, slot.moment)
}

/// Resolve the phase addressed by `mode` at `at` without creating it.
///
/// `None` means nobody has resolved that occurrence yet.
pub fn find<L: Ledger>(
  ledger: &L,
  circle: CircleId,
  at: NaiveDateTime,
  mode: PhaseMode,
) -> Result<Option<Phase>, L::Error> {
  let moments = ledger.moments_of(circle)?;
  let slot = locate(circle, &moments, at, mode)?;
  ledger.find_phase(slot.date, slot.moment)
}
