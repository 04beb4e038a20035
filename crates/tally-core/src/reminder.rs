//! Who needs a reminder.
//!
//! The scheduling itself lives with the server; this is the read-only query it
//! runs when a moment's reminder time comes around.

use chrono::NaiveDateTime;

use crate::{ids::MomentId, ledger::Ledger, statement, user::User};

/// Enabled, opted-in members of the moment's circle who have no statement for
/// the phase current at `at`.
///
/// Never writes: phases and statements are only looked up. A moment deleted
/// since the schedule was built yields nobody.
pub fn due<L: Ledger>(
  ledger: &L,
  moment: MomentId,
  at: NaiveDateTime,
) -> Result<Vec<User>, L::Error> {
  let Some(moment) = ledger.moment(moment)? else {
    return Ok(Vec::new());
  };

  let mut due = Vec::new();
  for member in ledger.members_of(moment.circle_id)? {
    if !member.enabled || !member.reminder {
      continue;
    }
    if statement::find_current(ledger, &member, at)?.is_none() {
      due.push(member);
    }
  }
  Ok(due)
}
