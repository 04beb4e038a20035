//! Reply texts.

use tally_core::{
  Error,
  circle::Circle,
  phase::Phase,
  statement::Choice,
  status::{StatusReport, Vote},
  user::User,
};

use crate::command::Command;

pub fn greeting(user: &User) -> String { format!("Hello {}!", user.display_name()) }

pub const NO_CIRCLE_YET: &str = "You do not have a circle yet!";

pub const WELCOME: &str = "Welcome!";

pub fn circle(circle: &Circle) -> String { format!("Your circle is {}", circle.name) }

pub fn now_is(phase: &Phase) -> String { format!("Now is {}", phase.label()) }

pub const JOIN_WHICH: &str = "You have to specify a circle";

pub fn joined(circle: &Circle) -> String { format!("You just joined circle {}", circle.name) }

pub fn left(circle: Option<&Circle>) -> String {
  match circle {
    Some(c) => format!("You just left circle {}", c.name),
    None => "You were not a member of a circle".to_owned(),
  }
}

pub fn declared(phase: &Phase, choice: Choice) -> String {
  match choice {
    Choice::Absent => format!("So sorry you won't be with us for {}!", phase.label()),
    Choice::Present { guests: 0 } => {
      format!("We'll be happy to see you for {}!", phase.label())
    }
    Choice::Present { guests } => format!(
      "We'll be happy to see you and {} for {}!",
      plural(guests, "guest"),
      phase.label()
    ),
  }
}

pub const COMMENTED: &str = "Thanks for your precious message!";

pub const REMINDER: &str = "We would REALLY like to know if you'll be eating with us or not!";

/// One message per section: header, total, the three lists, then the
/// circle's bottom line if it has one.
pub fn status(report: &StatusReport) -> Vec<String> {
  let mut out = vec![
    format!("Status for {}", report.phase.label()),
    format!("Known total is {}", report.known_total()),
    list("Present", report.present.iter().map(Vote::label)),
    list("Absent", report.absent.iter().map(Vote::label)),
    list(
      "Unknown",
      report
        .undecided
        .iter()
        .map(Vote::label)
        .chain(report.nonvoters.iter().map(User::display_name)),
    ),
  ];
  if let Some(bottom_line) = &report.circle.bottom_line {
    out.push(bottom_line.clone());
  }
  out
}

fn list(title: &str, names: impl Iterator<Item = String>) -> String {
  let names: Vec<String> = names.collect();
  if names.is_empty() {
    format!("{title} (0)")
  } else {
    format!("{title} ({}):\n{}", names.len(), names.join("\n"))
  }
}

fn plural(n: u32, word: &str) -> String {
  if n == 1 { format!("1 {word}") } else { format!("{n} {word}s") }
}

/// The reply for a domain failure while running `command`.
///
/// `Some(vec![])` means the command is dropped silently; `None` means the
/// failure is not the user's to see and the command must roll back.
pub fn failure(err: &Error, command: &Command) -> Option<Vec<String>> {
  let text = match err {
    Error::UserDisabled => return Some(Vec::new()),
    Error::NoCircle => match command {
      Command::Status => "You have to join a circle before knowing about others' presence!",
      _ => "You have to join a circle before expressing your presence!",
    }
    .to_owned(),
    Error::CircleNotFound(name) => format!("Circle {name} does not exist!"),
    Error::CircleNotJoinable(name) => format!("Circle {name} cannot be joined"),
    Error::MissingJoinCode(name) => {
      format!("You have to specify a code to join circle {name}")
    }
    Error::InvalidJoinCode(_) => "The code is invalid".to_owned(),
    Error::NoMomentsConfigured(_) => "Your circle has no moments configured yet".to_owned(),
    Error::DateOutOfRange(_) => return None,
  };
  Some(vec![text])
}
