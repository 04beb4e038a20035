//! Daily reminder jobs.
//!
//! One task per moment sleeps until the moment's next `reminder_time`, asks
//! the store (read-only) who has not declared for the current phase, and
//! pushes a [`Notification`] per member onto the outbox channel. A chat
//! transport drains that channel.

use chrono::{Days, NaiveDateTime, NaiveTime};
use tally_core::{ids::MomentId, moment::Moment, reminder};
use tally_store_sqlite::SqliteStore;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::{Clock, reply};

/// A message to deliver to one account outside of any conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub tid:  i64,
  pub text: String,
}

/// The first instant strictly after `now` whose time of day is `at`.
pub fn next_fire(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
  let today = now.date().and_time(at);
  if today > now {
    today
  } else {
    today.checked_add_days(Days::new(1)).unwrap_or(today)
  }
}

/// Notifications due for `moment` at `now`.
pub async fn check(
  store: &SqliteStore,
  moment: MomentId,
  now: NaiveDateTime,
) -> tally_store_sqlite::Result<Vec<Notification>> {
  let due = store.read(move |ledger| reminder::due(ledger, moment, now)).await?;
  Ok(
    due
      .into_iter()
      .map(|user| Notification {
        tid:  user.tid,
        text: reply::REMINDER.to_owned(),
      })
      .collect(),
  )
}

/// Spawn one reminder task per moment.
///
/// Tasks run until the outbox is closed. Moments added after startup get no
/// task until the next restart.
pub fn spawn(
  store: SqliteStore,
  moments: Vec<Moment>,
  clock: Clock,
  outbox: UnboundedSender<Notification>,
) -> Vec<JoinHandle<()>> {
  moments
    .into_iter()
    .map(|moment| {
      tokio::spawn(run(store.clone(), moment, clock.clone(), outbox.clone()))
    })
    .collect()
}

async fn run(
  store: SqliteStore,
  moment: Moment,
  clock: Clock,
  outbox: UnboundedSender<Notification>,
) {
  tracing::info!(
    moment = %moment.name,
    reminder_time = %moment.reminder_time,
    "scheduled reminders"
  );

  // Each round fires strictly after the previous one, so a clock that lags
  // the timer can never fire the same reminder twice.
  let mut last = clock();
  loop {
    let fire = next_fire(last, moment.reminder_time);
    let wait = (fire - clock()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;

    match check(&store, moment.moment_id, fire).await {
      Ok(notifications) => {
        tracing::info!(moment = %moment.name, count = notifications.len(), "sending reminders");
        for notification in notifications {
          if outbox.send(notification).is_err() {
            tracing::debug!(moment = %moment.name, "outbox closed; stopping reminders");
            return;
          }
        }
      }
      Err(e) => tracing::error!(moment = %moment.name, error = %e, "reminder check failed"),
    }
    last = fire;
  }
}
