//! [`SqliteLedger`] — the SQLite implementation of [`Ledger`].

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension as _, params};
use tally_core::{
  circle::Circle,
  ids::{CircleId, MomentId, PhaseId, StatementId, UserId},
  ledger::{Ledger, Upserted},
  moment::Moment,
  phase::Phase,
  statement::Statement,
  user::{Profile, User},
};

use crate::{
  Error, Result,
  encode::{
    CIRCLE_COLUMNS, MOMENT_COLUMNS, RawMoment, RawPhase, RawStatement, STATEMENT_COLUMNS,
    USER_COLUMNS, USER_WIDTH, encode_choice, encode_date, encode_dt, read_circle, read_user,
  },
};

/// One open transaction on the store's connection.
///
/// Only ever constructed by [`SqliteStore::transact`](crate::SqliteStore::transact)
/// and [`SqliteStore::read`](crate::SqliteStore::read), which own the
/// transaction guard and decide whether it commits.
pub struct SqliteLedger<'a> {
  pub(crate) conn: &'a Connection,
}

impl SqliteLedger<'_> {
  fn user_where(&self, clause: &str, key: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE {clause}");
    Ok(
      self
        .conn
        .prepare_cached(&sql)?
        .query_row(params![key], |row| read_user(row, 0))
        .optional()?,
    )
  }

  fn user_by_id(&self, id: UserId) -> Result<Option<User>> { self.user_where("u.id = ?1", id.0) }
}

impl Ledger for SqliteLedger<'_> {
  type Error = Error;

  // ── Circles & moments ─────────────────────────────────────────────────────

  fn circle(&self, id: CircleId) -> Result<Option<Circle>> {
    let sql = format!("SELECT {CIRCLE_COLUMNS} FROM circles c WHERE c.id = ?1");
    Ok(
      self
        .conn
        .prepare_cached(&sql)?
        .query_row(params![id.0], read_circle)
        .optional()?,
    )
  }

  fn circle_by_name(&self, name: &str) -> Result<Option<Circle>> {
    let sql = format!("SELECT {CIRCLE_COLUMNS} FROM circles c WHERE c.name = ?1");
    Ok(
      self
        .conn
        .prepare_cached(&sql)?
        .query_row(params![name], read_circle)
        .optional()?,
    )
  }

  fn moments_of(&self, circle: CircleId) -> Result<Vec<Moment>> {
    let sql = format!(
      "SELECT {MOMENT_COLUMNS} FROM moments m WHERE m.circle_id = ?1 ORDER BY m.time"
    );
    let raws = self
      .conn
      .prepare_cached(&sql)?
      .query_map(params![circle.0], |row| RawMoment::read(row, 0))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawMoment::into_moment).collect()
  }

  fn moment(&self, id: MomentId) -> Result<Option<Moment>> {
    let sql = format!("SELECT {MOMENT_COLUMNS} FROM moments m WHERE m.id = ?1");
    let raw = self
      .conn
      .prepare_cached(&sql)?
      .query_row(params![id.0], |row| RawMoment::read(row, 0))
      .optional()?;
    raw.map(RawMoment::into_moment).transpose()
  }

  fn members_of(&self, circle: CircleId) -> Result<Vec<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.circle_id = ?1 ORDER BY u.id");
    Ok(
      self
        .conn
        .prepare_cached(&sql)?
        .query_map(params![circle.0], |row| read_user(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?,
    )
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  fn user_by_tid(&self, tid: i64) -> Result<Option<User>> { self.user_where("u.tid = ?1", tid) }

  fn provision_user(&self, profile: &Profile) -> Result<Upserted<User>> {
    let inserted = self.conn.execute(
      "INSERT INTO users (tid, first_name, last_name, username, enabled, reminder, loud)
       VALUES (?1, ?2, ?3, ?4, 1, 1, 0)
       ON CONFLICT (tid) DO NOTHING",
      params![profile.tid, profile.first_name, profile.last_name, profile.username],
    )?;

    if inserted == 1 {
      let id = UserId(self.conn.last_insert_rowid());
      tracing::debug!(tid = profile.tid, user_id = %id, "provisioned user");
      return self
        .user_by_id(id)?
        .map(Upserted::Created)
        .ok_or(Error::ConflictOnCreate("user"));
    }
    self
      .user_by_tid(profile.tid)?
      .map(Upserted::Existing)
      .ok_or(Error::ConflictOnCreate("user"))
  }

  fn set_user_circle(&self, user: UserId, circle: Option<CircleId>) -> Result<()> {
    self.conn.execute(
      "UPDATE users SET circle_id = ?1 WHERE id = ?2",
      params![circle.map(|c| c.0), user.0],
    )?;
    Ok(())
  }

  // ── Phases ────────────────────────────────────────────────────────────────

  fn find_phase(&self, date: NaiveDate, moment: &Moment) -> Result<Option<Phase>> {
    let raw = self
      .conn
      .prepare_cached("SELECT id, date FROM phases WHERE date = ?1 AND moment_id = ?2")?
      .query_row(params![encode_date(date), moment.moment_id.0], |row| {
        Ok(RawPhase {
          phase_id: row.get(0)?,
          date:     row.get(1)?,
        })
      })
      .optional()?;
    raw.map(|r| r.into_phase(moment)).transpose()
  }

  fn phase_or_insert(&self, date: NaiveDate, moment: &Moment) -> Result<Upserted<Phase>> {
    let inserted = self.conn.execute(
      "INSERT INTO phases (date, moment_id) VALUES (?1, ?2)
       ON CONFLICT (date, moment_id) DO NOTHING",
      params![encode_date(date), moment.moment_id.0],
    )?;

    if inserted == 1 {
      let phase = Phase {
        phase_id: PhaseId(self.conn.last_insert_rowid()),
        date,
        moment: moment.clone(),
      };
      tracing::debug!(phase = %phase.label(), phase_id = %phase.phase_id, "materialised phase");
      return Ok(Upserted::Created(phase));
    }
    self
      .find_phase(date, moment)?
      .map(Upserted::Existing)
      .ok_or(Error::ConflictOnCreate("phase"))
  }

  // ── Statements ────────────────────────────────────────────────────────────

  fn find_statement(&self, user: UserId, phase: PhaseId) -> Result<Option<Statement>> {
    let sql = format!(
      "SELECT {STATEMENT_COLUMNS} FROM statements s WHERE s.user_id = ?1 AND s.phase_id = ?2"
    );
    let raw = self
      .conn
      .prepare_cached(&sql)?
      .query_row(params![user.0, phase.0], |row| RawStatement::read(row, 0))
      .optional()?;
    raw.map(RawStatement::into_statement).transpose()
  }

  fn touch_statement(
    &self,
    user: UserId,
    phase: PhaseId,
    at: NaiveDateTime,
  ) -> Result<Upserted<Statement>> {
    let at_str = encode_dt(at);

    let inserted = self.conn.execute(
      "INSERT INTO statements (user_id, phase_id, time) VALUES (?1, ?2, ?3)
       ON CONFLICT (user_id, phase_id) DO NOTHING",
      params![user.0, phase.0, at_str],
    )?;
    if inserted == 1 {
      tracing::debug!(user_id = %user, phase_id = %phase, "created statement");
      return Ok(Upserted::Created(Statement {
        statement_id: StatementId(self.conn.last_insert_rowid()),
        user_id:      user,
        phase_id:     phase,
        time:         at,
        comment:      None,
        choice:       None,
      }));
    }

    let mut statement = self
      .find_statement(user, phase)?
      .ok_or(Error::ConflictOnCreate("statement"))?;
    self.conn.execute(
      "UPDATE statements SET time = ?1 WHERE id = ?2",
      params![at_str, statement.statement_id.0],
    )?;
    statement.time = at;
    Ok(Upserted::Existing(statement))
  }

  fn update_statement(&self, statement: &Statement) -> Result<()> {
    self.conn.execute(
      "UPDATE statements SET time = ?1, comment = ?2, choice = ?3 WHERE id = ?4",
      params![
        encode_dt(statement.time),
        statement.comment,
        encode_choice(statement.choice),
        statement.statement_id.0,
      ],
    )?;
    Ok(())
  }

  fn statements_for_phase(
    &self,
    circle: CircleId,
    phase: PhaseId,
  ) -> Result<Vec<(User, Statement)>> {
    let sql = format!(
      "SELECT {USER_COLUMNS}, {STATEMENT_COLUMNS}
       FROM statements s
       JOIN users u ON u.id = s.user_id
       WHERE u.circle_id = ?1 AND u.enabled = 1 AND s.phase_id = ?2
       ORDER BY s.time, s.id"
    );
    let rows = self
      .conn
      .prepare_cached(&sql)?
      .query_map(params![circle.0, phase.0], |row| {
        Ok((read_user(row, 0)?, RawStatement::read(row, USER_WIDTH)?))
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    rows
      .into_iter()
      .map(|(user, raw)| Ok((user, raw.into_statement()?)))
      .collect()
  }
}
