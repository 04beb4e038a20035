//! Joining and leaving circles.

use crate::{Error, circle::Circle, ledger::Ledger, user::User};

/// Move `user` into the circle called `name`, provided `code` authorises it.
///
/// A user already in another circle switches circles.
pub fn join<L: Ledger>(
  ledger: &L,
  user: &User,
  name: &str,
  code: Option<&str>,
) -> Result<Circle, L::Error> {
  let circle = ledger
    .circle_by_name(name)?
    .ok_or_else(|| Error::CircleNotFound(name.to_owned()))?;
  circle.authorize_join(code)?;
  ledger.set_user_circle(user.user_id, Some(circle.circle_id))?;
  Ok(circle)
}

/// Detach `user` from its circle. Returns the circle left, if any.
pub fn leave<L: Ledger>(ledger: &L, user: &User) -> Result<Option<Circle>, L::Error> {
  let Some(circle_id) = user.circle_id else {
    return Ok(None);
  };
  let circle = ledger.circle(circle_id)?;
  ledger.set_user_circle(user.user_id, None)?;
  Ok(circle)
}
