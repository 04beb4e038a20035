//! The command façade: one chat message in, reply texts out.
//!
//! Each message runs as a single unit of work. User-facing failures (no
//! circle, bad join code, ...) become replies and whatever was validated
//! before them (auto-provisioning the sender) commits. Anything else rolls
//! the whole command back, is logged, and produces no reply.

use chrono::NaiveDateTime;
use tally_core::{
  DomainError as _, Error, Ledger,
  membership,
  phase::{self, PhaseMode},
  statement::{self, Choice},
  status,
  user::{Profile, User},
};
use tally_store_sqlite::SqliteStore;

use crate::{command::Command, reply};

/// Parse and run `text` sent by `from` at `now`.
pub async fn handle(
  store: &SqliteStore,
  from: Profile,
  text: &str,
  now: NaiveDateTime,
) -> Vec<String> {
  let Some(command) = Command::parse(text) else {
    tracing::debug!(tid = from.tid, "ignoring message");
    return Vec::new();
  };

  let tid = from.tid;
  tracing::debug!(tid, ?command, "handling command");
  match store
    .transact(move |ledger| dispatch(ledger, &from, &command, now))
    .await
  {
    Ok(replies) => replies,
    Err(e) => {
      tracing::error!(tid, error = %e, "command rolled back");
      Vec::new()
    }
  }
}

/// Run `command` inside `ledger`, turning user-facing failures into replies.
pub fn dispatch<L: Ledger>(
  ledger: &L,
  from: &Profile,
  command: &Command,
  now: NaiveDateTime,
) -> Result<Vec<String>, L::Error> {
  match run(ledger, from, command, now) {
    Ok(replies) => Ok(replies),
    Err(err) => match err.domain().and_then(|e| reply::failure(e, command)) {
      Some(replies) => {
        tracing::info!(tid = from.tid, reason = %err, "command refused");
        Ok(replies)
      }
      None => Err(err),
    },
  }
}

/// The sender as an enabled user, provisioned on first contact.
fn identify<L: Ledger>(ledger: &L, from: &Profile) -> Result<User, L::Error> {
  let user = ledger.provision_user(from)?;
  if user.was_created() {
    tracing::info!(tid = from.tid, "new user");
  }
  let user = user.into_inner();
  if !user.enabled {
    return Err(Error::UserDisabled.into());
  }
  Ok(user)
}

fn run<L: Ledger>(
  ledger: &L,
  from: &Profile,
  command: &Command,
  now: NaiveDateTime,
) -> Result<Vec<String>, L::Error> {
  let user = identify(ledger, from)?;

  match command {
    Command::Start => start(ledger, &user, now),

    Command::Join { circle: None, .. } => Ok(vec![reply::JOIN_WHICH.to_owned()]),
    Command::Join { circle: Some(name), code } => {
      let circle = membership::join(ledger, &user, name, code.as_deref())?;
      Ok(vec![reply::joined(&circle)])
    }

    Command::Leave => {
      let circle = membership::leave(ledger, &user)?;
      Ok(vec![reply::left(circle.as_ref())])
    }

    Command::Present { guests } => {
      declare(ledger, &user, now, PhaseMode::Current, Choice::Present { guests: *guests })
    }
    Command::Absent => declare(ledger, &user, now, PhaseMode::Current, Choice::Absent),
    Command::NextPresent { guests } => {
      declare(ledger, &user, now, PhaseMode::Next, Choice::Present { guests: *guests })
    }
    Command::NextAbsent => declare(ledger, &user, now, PhaseMode::Next, Choice::Absent),

    Command::Status => {
      let circle_id = user.circle_id.ok_or(Error::NoCircle)?;
      let circle = ledger.circle(circle_id)?.ok_or(Error::NoCircle)?;
      let report = status::aggregate(ledger, &circle, now)?;
      Ok(reply::status(&report))
    }

    Command::Comment(text) => {
      statement::comment(ledger, &user, now, text)?;
      Ok(vec![reply::COMMENTED.to_owned()])
    }

    Command::Usage(usage) => Ok(vec![(*usage).to_owned()]),
  }
}

fn start<L: Ledger>(ledger: &L, user: &User, now: NaiveDateTime) -> Result<Vec<String>, L::Error> {
  let mut replies = vec![reply::greeting(user)];
  match user.circle_id.map(|id| ledger.circle(id)).transpose()?.flatten() {
    None => replies.push(reply::NO_CIRCLE_YET.to_owned()),
    Some(circle) => {
      let phase =
        phase::resolve_or_create(ledger, circle.circle_id, now, PhaseMode::Current)?.into_inner();
      replies.push(reply::circle(&circle));
      replies.push(reply::now_is(&phase));
    }
  }
  replies.push(reply::WELCOME.to_owned());
  Ok(replies)
}

fn declare<L: Ledger>(
  ledger: &L,
  user: &User,
  now: NaiveDateTime,
  mode: PhaseMode,
  choice: Choice,
) -> Result<Vec<String>, L::Error> {
  let (phase, _) = statement::declare(ledger, user, now, mode, choice)?;
  Ok(vec![reply::declared(&phase, choice)])
}
