//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`, times of day as `HH:MM:SS`, timestamps
//! as ISO 8601 without offset (wall-clock time). Row readers take a column
//! offset so joined selects can read several entities from one row.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Row;
use tally_core::{
  circle::Circle,
  ids::{CircleId, MomentId, PhaseId, StatementId, UserId},
  moment::Moment,
  phase::Phase,
  statement::{Choice, Statement},
  user::User,
};

use crate::{Error, Result};

// ─── Dates & times ───────────────────────────────────────────────────────────

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M:%S";
const DT_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FMT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FMT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FMT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FMT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_dt(dt: NaiveDateTime) -> String { dt.format(DT_FMT).to_string() }

pub fn decode_dt(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, DT_FMT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Choice ──────────────────────────────────────────────────────────────────

pub fn encode_choice(c: Option<Choice>) -> Option<i64> { c.map(Choice::to_raw) }

pub fn decode_choice(raw: Option<i64>) -> Result<Option<Choice>> {
  raw
    .map(|n| Choice::from_raw(n).ok_or(Error::InvalidChoice(n)))
    .transpose()
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const CIRCLE_COLUMNS: &str = "c.id, c.name, c.can_join, c.join_code, c.bottom_line";

pub const MOMENT_COLUMNS: &str = "m.id, m.circle_id, m.name, m.time, m.reminder_time";

pub const USER_COLUMNS: &str = "u.id, u.circle_id, u.tid, u.first_name, u.last_name, \
                                u.username, u.enabled, u.default_choice, u.reminder, u.loud";

pub const USER_WIDTH: usize = 10;

pub const STATEMENT_COLUMNS: &str = "s.id, s.user_id, s.phase_id, s.time, s.comment, s.choice";

// ─── Row types ───────────────────────────────────────────────────────────────

pub fn read_circle(row: &Row<'_>) -> rusqlite::Result<Circle> {
  Ok(Circle {
    circle_id:   CircleId(row.get(0)?),
    name:        row.get(1)?,
    can_join:    row.get(2)?,
    join_code:   row.get(3)?,
    bottom_line: row.get(4)?,
  })
}

pub fn read_user(row: &Row<'_>, at: usize) -> rusqlite::Result<User> {
  Ok(User {
    user_id:        UserId(row.get(at)?),
    circle_id:      row.get::<_, Option<i64>>(at + 1)?.map(CircleId),
    tid:            row.get(at + 2)?,
    first_name:     row.get(at + 3)?,
    last_name:      row.get(at + 4)?,
    username:       row.get(at + 5)?,
    enabled:        row.get(at + 6)?,
    default_choice: row.get(at + 7)?,
    reminder:       row.get(at + 8)?,
    loud:           row.get(at + 9)?,
  })
}

/// Raw values read directly from a `moments` row.
pub struct RawMoment {
  pub moment_id:     i64,
  pub circle_id:     i64,
  pub name:          String,
  pub time:          String,
  pub reminder_time: String,
}

impl RawMoment {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      moment_id:     row.get(at)?,
      circle_id:     row.get(at + 1)?,
      name:          row.get(at + 2)?,
      time:          row.get(at + 3)?,
      reminder_time: row.get(at + 4)?,
    })
  }

  pub fn into_moment(self) -> Result<Moment> {
    Ok(Moment {
      moment_id:     MomentId(self.moment_id),
      circle_id:     CircleId(self.circle_id),
      name:          self.name,
      time:          decode_time(&self.time)?,
      reminder_time: decode_time(&self.reminder_time)?,
    })
  }
}

/// Raw values read from a `phases` row; the moment is supplied by the caller.
pub struct RawPhase {
  pub phase_id: i64,
  pub date:     String,
}

impl RawPhase {
  pub fn into_phase(self, moment: &Moment) -> Result<Phase> {
    Ok(Phase {
      phase_id: PhaseId(self.phase_id),
      date:     decode_date(&self.date)?,
      moment:   moment.clone(),
    })
  }
}

/// Raw values read directly from a `statements` row.
pub struct RawStatement {
  pub statement_id: i64,
  pub user_id:      i64,
  pub phase_id:     i64,
  pub time:         String,
  pub comment:      Option<String>,
  pub choice:       Option<i64>,
}

impl RawStatement {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      statement_id: row.get(at)?,
      user_id:      row.get(at + 1)?,
      phase_id:     row.get(at + 2)?,
      time:         row.get(at + 3)?,
      comment:      row.get(at + 4)?,
      choice:       row.get(at + 5)?,
    })
  }

  pub fn into_statement(self) -> Result<Statement> {
    Ok(Statement {
      statement_id: StatementId(self.statement_id),
      user_id:      UserId(self.user_id),
      phase_id:     PhaseId(self.phase_id),
      time:         decode_dt(&self.time)?,
      comment:      self.comment,
      choice:       decode_choice(self.choice)?,
    })
  }
}
