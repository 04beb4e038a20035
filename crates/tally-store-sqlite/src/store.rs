//! [`SqliteStore`] — the connection handle and its unit-of-work entry points.

use std::path::Path;

use rusqlite::{TransactionBehavior, params};
use tally_core::{
  circle::{Circle, NewCircle},
  ids::{CircleId, MomentId},
  ledger::Ledger as _,
  moment::{Moment, NewMoment},
  user::User,
};

use crate::{
  Result,
  encode::{MOMENT_COLUMNS, RawMoment, encode_time},
  ledger::SqliteLedger,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Per-user preference switches; `None` leaves a flag unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserFlags {
  pub enabled:  Option<bool>,
  pub reminder: Option<bool>,
  pub loud:     Option<bool>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Units of work ─────────────────────────────────────────────────────────

  /// Run `work` as one write transaction.
  ///
  /// The transaction takes the write lock up front (`BEGIN IMMEDIATE`). It
  /// commits only if `work` returns `Ok`; on `Err` the guard is dropped and
  /// everything `work` did is rolled back.
  pub async fn transact<F, T>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&SqliteLedger<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = work(&SqliteLedger { conn: &tx });
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await?
  }

  /// Run `work` in a deferred transaction that is always rolled back.
  ///
  /// Meant for read-only jobs such as the reminder check; it never holds the
  /// write lock.
  pub async fn read<F, T>(&self, work: F) -> Result<T>
  where
    F: FnOnce(&SqliteLedger<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        Ok(work(&SqliteLedger { conn: &tx }))
      })
      .await?
  }

  // ── Administration ────────────────────────────────────────────────────────

  /// Create a circle. Fails if the name is taken.
  pub async fn create_circle(&self, input: NewCircle) -> Result<Circle> {
    self
      .transact(move |ledger| {
        ledger.conn.execute(
          "INSERT INTO circles (name, can_join, join_code, bottom_line) VALUES (?1, ?2, ?3, ?4)",
          params![input.name, input.can_join, input.join_code, input.bottom_line],
        )?;
        let circle = Circle {
          circle_id:   CircleId(ledger.conn.last_insert_rowid()),
          name:        input.name,
          can_join:    input.can_join,
          join_code:   input.join_code,
          bottom_line: input.bottom_line,
        };
        tracing::info!(circle = %circle.name, circle_id = %circle.circle_id, "created circle");
        Ok(circle)
      })
      .await
  }

  /// Add a moment to an existing circle. Fails if the circle already has a
  /// moment with the same name or time of day.
  pub async fn add_moment(&self, input: NewMoment) -> Result<Moment> {
    self
      .transact(move |ledger| {
        if ledger.circle(input.circle_id)?.is_none() {
          return Err(
            tally_core::Error::CircleNotFound(format!("#{}", input.circle_id)).into(),
          );
        }
        ledger.conn.execute(
          "INSERT INTO moments (circle_id, name, time, reminder_time) VALUES (?1, ?2, ?3, ?4)",
          params![
            input.circle_id.0,
            input.name,
            encode_time(input.time),
            encode_time(input.reminder_time),
          ],
        )?;
        let moment = Moment {
          moment_id:     MomentId(ledger.conn.last_insert_rowid()),
          circle_id:     input.circle_id,
          name:          input.name,
          time:          input.time,
          reminder_time: input.reminder_time,
        };
        tracing::info!(moment = %moment.name, time = %moment.time, "added moment");
        Ok(moment)
      })
      .await
  }

  pub async fn circle_by_name(&self, name: impl Into<String>) -> Result<Option<Circle>> {
    let name = name.into();
    self.read(move |ledger| ledger.circle_by_name(&name)).await
  }

  /// Every moment of every circle, ordered by circle then time of day.
  pub async fn all_moments(&self) -> Result<Vec<Moment>> {
    self
      .read(|ledger| {
        let sql = format!("SELECT {MOMENT_COLUMNS} FROM moments m ORDER BY m.circle_id, m.time");
        let raws = ledger
          .conn
          .prepare(&sql)?
          .query_map([], |row| RawMoment::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawMoment::into_moment).collect()
      })
      .await
  }

  /// Change preference flags of the user with external id `tid`.
  /// Returns the updated user, or `None` if no such user exists.
  pub async fn update_user_flags(&self, tid: i64, flags: UserFlags) -> Result<Option<User>> {
    self
      .transact(move |ledger| {
        ledger.conn.execute(
          "UPDATE users SET
             enabled  = COALESCE(?1, enabled),
             reminder = COALESCE(?2, reminder),
             loud     = COALESCE(?3, loud)
           WHERE tid = ?4",
          params![flags.enabled, flags.reminder, flags.loud, tid],
        )?;
        ledger.user_by_tid(tid)
      })
      .await
  }
}
