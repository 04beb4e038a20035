//! Moment — a named daily time slot of a circle (e.g. "lunch at 13:00").

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::ids::{CircleId, MomentId};

/// A recurring daily slot.
///
/// Within a circle both `name` and `time` are unique, so ordering a circle's
/// moments by `time` is total and deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moment {
  pub moment_id:     MomentId,
  pub circle_id:     CircleId,
  pub name:          String,
  /// Time of day at which this moment becomes the current one.
  pub time:          NaiveTime,
  /// Time of day at which members without a statement are reminded.
  pub reminder_time: NaiveTime,
}

/// Input for administratively adding a moment to a circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMoment {
  pub circle_id:     CircleId,
  pub name:          String,
  pub time:          NaiveTime,
  pub reminder_time: NaiveTime,
}
