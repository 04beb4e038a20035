//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tally_core::{
  circle::{Circle, NewCircle},
  ids::CircleId,
  ledger::Ledger as _,
  membership,
  moment::{Moment, NewMoment},
  phase::{self, PhaseMode},
  reminder,
  statement::{self, Choice},
  status,
  user::{Profile, User},
};

use crate::{Error, SqliteStore, UserFlags};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn hm(h: u32, m: u32) -> NaiveTime { NaiveTime::from_hms_opt(h, m, 0).unwrap() }

fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2026, 10, 16).unwrap() }

fn at(h: u32, m: u32) -> NaiveDateTime { day().and_time(hm(h, m)) }

/// A circle with lunch at 13:00 and dinner at 20:00.
async fn seed(s: &SqliteStore) -> (Circle, Vec<Moment>) {
  let circle = s.create_circle(NewCircle::open("home")).await.unwrap();
  let mut moments = Vec::new();
  // Inserted out of order on purpose.
  for (name, time, remind_at) in [
    ("dinner", hm(20, 0), hm(18, 30)),
    ("lunch", hm(13, 0), hm(11, 0)),
  ] {
    moments.push(
      s.add_moment(NewMoment {
        circle_id:     circle.circle_id,
        name:          name.into(),
        time,
        reminder_time: remind_at,
      })
      .await
      .unwrap(),
    );
  }
  moments.sort_by_key(|m| m.time);
  (circle, moments)
}

fn profile(tid: i64, first: &str) -> Profile {
  Profile {
    tid,
    first_name: first.into(),
    last_name:  None,
    username:   None,
  }
}

async fn member(s: &SqliteStore, tid: i64, first: &str, circle: Option<CircleId>) -> User {
  let p = profile(tid, first);
  s.transact(move |l| {
    let user = l.provision_user(&p)?.into_inner();
    l.set_user_circle(user.user_id, circle)?;
    Ok(l.user_by_tid(p.tid)?.expect("just provisioned"))
  })
  .await
  .unwrap()
}

async fn count(s: &SqliteStore, table: &'static str) -> i64 {
  s.read(move |l| {
    Ok(l.conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
  })
  .await
  .unwrap()
}

// ─── Moment registry ─────────────────────────────────────────────────────────

#[tokio::test]
async fn moments_are_ordered_by_time_of_day() {
  let s = store().await;
  let (circle, _) = seed(&s).await;

  let id = circle.circle_id;
  let moments = s.read(move |l| l.moments_of(id)).await.unwrap();
  let names: Vec<_> = moments.iter().map(|m| m.name.as_str()).collect();
  assert_eq!(names, ["lunch", "dinner"]);
  assert_eq!(moments[0].reminder_time, hm(11, 0));
}

#[tokio::test]
async fn duplicate_moment_time_is_rejected() {
  let s = store().await;
  let (circle, _) = seed(&s).await;

  let err = s
    .add_moment(NewMoment {
      circle_id:     circle.circle_id,
      name:          "supper".into(),
      time:          hm(20, 0),
      reminder_time: hm(19, 0),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Sqlite(_)), "{err}");
}

// ─── Phase resolution ────────────────────────────────────────────────────────

#[tokio::test]
async fn day_boundary_resolution() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let id = circle.circle_id;

  let (early_current, early_next, afternoon) = s
    .transact(move |l| {
      Ok((
        phase::resolve_or_create(l, id, at(8, 0), PhaseMode::Current)?,
        phase::resolve_or_create(l, id, at(8, 0), PhaseMode::Next)?,
        phase::resolve_or_create(l, id, at(15, 0), PhaseMode::Current)?,
      ))
    })
    .await
    .unwrap();

  assert!(early_current.was_created());
  let p = early_current.get();
  assert_eq!((p.date, p.moment.name.as_str()), (day().pred_opt().unwrap(), "dinner"));

  let p = early_next.get();
  assert_eq!((p.date, p.moment.name.as_str()), (day(), "lunch"));

  // 15:00 lands on the phase that 08:00's "next" already created.
  assert!(!afternoon.was_created());
  assert_eq!(afternoon.get().phase_id, early_next.get().phase_id);
  assert_eq!(count(&s, "phases").await, 2);
}

#[tokio::test]
async fn resolution_is_idempotent_across_instants() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let id = circle.circle_id;

  let first = s
    .transact(move |l| phase::resolve_or_create(l, id, at(13, 5), PhaseMode::Current))
    .await
    .unwrap();
  let second = s
    .transact(move |l| phase::resolve_or_create(l, id, at(19, 59), PhaseMode::Current))
    .await
    .unwrap();

  assert!(first.was_created());
  assert!(!second.was_created());
  assert_eq!(first.get().phase_id, second.get().phase_id);
  assert_eq!(count(&s, "phases").await, 1);
}

#[tokio::test]
async fn find_phase_never_creates() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let id = circle.circle_id;

  let found = s
    .transact(move |l| phase::find(l, id, at(15, 0), PhaseMode::Current))
    .await
    .unwrap();
  assert!(found.is_none());
  assert_eq!(count(&s, "phases").await, 0);
}

#[tokio::test]
async fn circle_without_moments_cannot_resolve() {
  let s = store().await;
  let circle = s.create_circle(NewCircle::open("empty")).await.unwrap();
  let id = circle.circle_id;

  let err = s
    .transact(move |l| phase::resolve_or_create(l, id, at(12, 0), PhaseMode::Current))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::NoMomentsConfigured(c)) if c == id));
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_only_access_creates_nothing() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let ada = member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let u = ada.clone();
  let found = s
    .transact(move |l| statement::find_current(l, &u, at(15, 0)))
    .await
    .unwrap();
  assert!(found.is_none());
  assert_eq!(count(&s, "phases").await, 0);
  assert_eq!(count(&s, "statements").await, 0);

  let u = ada.clone();
  let (_, created) = s
    .transact(move |l| statement::for_update(l, &u, at(15, 0), PhaseMode::Current))
    .await
    .unwrap();
  assert!(created.was_created());
  assert_eq!(created.get().choice, None);
  assert_eq!(count(&s, "statements").await, 1);

  let u = ada.clone();
  let found = s
    .transact(move |l| statement::find_current(l, &u, at(16, 0)))
    .await
    .unwrap();
  assert_eq!(found.map(|st| st.statement_id), Some(created.get().statement_id));
}

#[tokio::test]
async fn for_update_stamps_time_and_keeps_choice() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let ada = member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let u = ada.clone();
  let (_, declared) = s
    .transact(move |l| statement::declare(l, &u, at(14, 0), PhaseMode::Current, Choice::ALONE))
    .await
    .unwrap();
  assert_eq!(declared.time, at(14, 0));

  let u = ada.clone();
  let (_, touched) = s
    .transact(move |l| statement::for_update(l, &u, at(17, 30), PhaseMode::Current))
    .await
    .unwrap();
  assert!(!touched.was_created());
  let touched = touched.into_inner();
  assert_eq!(touched.statement_id, declared.statement_id);
  assert_eq!(touched.time, at(17, 30));
  assert_eq!(touched.choice, Some(Choice::ALONE));

  let u = ada.clone();
  let stored = s
    .transact(move |l| statement::find_current(l, &u, at(18, 0)))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.time, at(17, 30));
  assert_eq!(count(&s, "statements").await, 1);
}

#[tokio::test]
async fn comment_is_independent_of_choice() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let ada = member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let u = ada.clone();
  let (_, commented) = s
    .transact(move |l| statement::comment(l, &u, at(14, 0), "running late"))
    .await
    .unwrap();
  assert_eq!(commented.choice, None);
  assert_eq!(commented.comment.as_deref(), Some("running late"));

  let u = ada.clone();
  let (_, declared) = s
    .transact(move |l| {
      statement::declare(l, &u, at(14, 5), PhaseMode::Current, Choice::Present { guests: 1 })
    })
    .await
    .unwrap();
  assert_eq!(declared.comment.as_deref(), Some("running late"));
  assert_eq!(declared.choice, Some(Choice::Present { guests: 1 }));
}

#[tokio::test]
async fn declaring_for_next_phase_leaves_current_untouched() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let ada = member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let u = ada.clone();
  let (next_phase, _) = s
    .transact(move |l| statement::declare(l, &u, at(15, 0), PhaseMode::Next, Choice::Absent))
    .await
    .unwrap();
  assert_eq!((next_phase.date, next_phase.moment.name.as_str()), (day(), "dinner"));

  let u = ada.clone();
  let current = s
    .transact(move |l| statement::find_current(l, &u, at(15, 30)))
    .await
    .unwrap();
  assert!(current.is_none());

  // Once dinner starts, the pre-declared statement is the current one.
  let u = ada.clone();
  let later = s
    .transact(move |l| statement::find_current(l, &u, at(20, 30)))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(later.choice, Some(Choice::Absent));
}

#[tokio::test]
async fn user_without_circle_has_no_statement() {
  let s = store().await;
  seed(&s).await;
  let loner = member(&s, 7, "Lone", None).await;

  let u = loner.clone();
  let err = s
    .transact(move |l| statement::declare(l, &u, at(15, 0), PhaseMode::Current, Choice::ALONE))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::NoCircle)));

  let u = loner.clone();
  let err = s
    .transact(move |l| statement::find_current(l, &u, at(15, 0)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::NoCircle)));
}

#[tokio::test]
async fn failed_unit_of_work_rolls_back() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let ada = member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let u = ada.clone();
  let err = s
    .transact(move |l| {
      statement::declare(l, &u, at(15, 0), PhaseMode::Current, Choice::ALONE)?;
      Err::<(), _>(tally_core::Error::UserDisabled.into())
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(tally_core::Error::UserDisabled)));
  assert_eq!(count(&s, "phases").await, 0);
  assert_eq!(count(&s, "statements").await, 0);
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn status_partitions_members() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let a = member(&s, 1, "A", Some(circle.circle_id)).await;
  let b = member(&s, 2, "B", Some(circle.circle_id)).await;
  member(&s, 3, "C", Some(circle.circle_id)).await;

  let (ua, ub) = (a.clone(), b.clone());
  s.transact(move |l| {
    statement::declare(l, &ua, at(14, 0), PhaseMode::Current, Choice::ALONE)?;
    statement::declare(l, &ub, at(14, 1), PhaseMode::Current, Choice::Present { guests: 2 })?;
    Ok(())
  })
  .await
  .unwrap();

  let c = circle.clone();
  let report = s
    .transact(move |l| status::aggregate(l, &c, at(16, 0)))
    .await
    .unwrap();

  let names = |votes: &[status::Vote]| {
    votes.iter().map(|v| v.user.first_name.clone()).collect::<Vec<_>>()
  };
  assert_eq!(names(&report.present[..]), ["A", "B"]);
  assert!(report.absent.is_empty());
  assert!(report.undecided.is_empty());
  let nonvoters: Vec<_> = report.nonvoters.iter().map(|u| u.first_name.as_str()).collect();
  assert_eq!(nonvoters, ["C"]);
  assert_eq!(report.known_total(), 4);
  assert_eq!(report.present[1].label(), "B +2");
}

#[tokio::test]
async fn status_buckets_undecided_and_skips_disabled() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let a = member(&s, 1, "A", Some(circle.circle_id)).await;
  let b = member(&s, 2, "B", Some(circle.circle_id)).await;
  let ghost = member(&s, 3, "Ghost", Some(circle.circle_id)).await;
  // Belongs to another circle: never shows up.
  let other = s.create_circle(NewCircle::open("elsewhere")).await.unwrap();
  member(&s, 4, "Stranger", Some(other.circle_id)).await;

  let (ua, ub, ug) = (a.clone(), b.clone(), ghost.clone());
  s.transact(move |l| {
    statement::comment(l, &ua, at(14, 0), "not sure yet")?;
    statement::declare(l, &ub, at(14, 0), PhaseMode::Current, Choice::Absent)?;
    statement::declare(l, &ug, at(14, 0), PhaseMode::Current, Choice::ALONE)?;
    Ok(())
  })
  .await
  .unwrap();
  s.update_user_flags(3, UserFlags { enabled: Some(false), ..UserFlags::default() })
    .await
    .unwrap();

  let c = circle.clone();
  let report = s
    .transact(move |l| status::aggregate(l, &c, at(16, 0)))
    .await
    .unwrap();

  assert!(report.present.is_empty());
  assert_eq!(report.absent.len(), 1);
  assert_eq!(report.undecided.len(), 1);
  assert_eq!(report.undecided[0].label(), "A (not sure yet)");
  assert!(report.nonvoters.is_empty());
  assert_eq!(report.known_total(), 0);
}

// ─── Membership ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn join_authorization() {
  let s = store().await;
  s.create_circle(NewCircle {
    name:        "closed".into(),
    can_join:    false,
    join_code:   Some("pw".into()),
    bottom_line: None,
  })
  .await
  .unwrap();
  s.create_circle(NewCircle {
    name:        "coded".into(),
    can_join:    true,
    join_code:   Some("pw".into()),
    bottom_line: None,
  })
  .await
  .unwrap();
  let ada = member(&s, 1, "Ada", None).await;

  let attempt = |name: &'static str, code: Option<&'static str>| {
    let s = s.clone();
    let u = ada.clone();
    async move {
      s.transact(move |l| membership::join(l, &u, name, code))
        .await
    }
  };

  assert!(matches!(
    attempt("closed", Some("pw")).await,
    Err(Error::Core(tally_core::Error::CircleNotJoinable(_)))
  ));
  assert!(matches!(
    attempt("coded", None).await,
    Err(Error::Core(tally_core::Error::MissingJoinCode(_)))
  ));
  assert!(matches!(
    attempt("coded", Some("PW")).await,
    Err(Error::Core(tally_core::Error::InvalidJoinCode(_)))
  ));
  assert!(matches!(
    attempt("nowhere", None).await,
    Err(Error::Core(tally_core::Error::CircleNotFound(_)))
  ));
  assert!(s.read(|l| l.user_by_tid(1)).await.unwrap().unwrap().circle_id.is_none());

  let joined = attempt("coded", Some("pw")).await.unwrap();
  assert_eq!(joined.name, "coded");
  let ada = s.read(|l| l.user_by_tid(1)).await.unwrap().unwrap();
  assert_eq!(ada.circle_id, Some(joined.circle_id));
}

#[tokio::test]
async fn leave_detaches_user() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  let ada = member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let u = ada.clone();
  let left = s.transact(move |l| membership::leave(l, &u)).await.unwrap();
  assert_eq!(left.map(|c| c.name), Some("home".into()));

  let ada = s.read(|l| l.user_by_tid(1)).await.unwrap().unwrap();
  assert!(ada.circle_id.is_none());
  let left = s.transact(move |l| membership::leave(l, &ada)).await.unwrap();
  assert!(left.is_none());
}

#[tokio::test]
async fn deleting_a_circle_cascades_moments_and_detaches_members() {
  let s = store().await;
  let (circle, _) = seed(&s).await;
  member(&s, 1, "Ada", Some(circle.circle_id)).await;

  let id = circle.circle_id;
  s.transact(move |l| {
    l.conn.execute("DELETE FROM circles WHERE id = ?1", [id.0])?;
    Ok(())
  })
  .await
  .unwrap();

  assert_eq!(count(&s, "moments").await, 0);
  assert_eq!(count(&s, "users").await, 1);
  let ada = s.read(|l| l.user_by_tid(1)).await.unwrap().unwrap();
  assert!(ada.circle_id.is_none());
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn provisioning_is_keyed_on_tid() {
  let s = store().await;

  let first = s
    .transact(|l| l.provision_user(&profile(99, "Ada")))
    .await
    .unwrap();
  assert!(first.was_created());
  let user = first.get();
  assert!(user.enabled);
  assert!(user.reminder);
  assert!(!user.loud);
  assert!(user.circle_id.is_none());

  // A second contact with a different display name is the same identity.
  let second = s
    .transact(|l| l.provision_user(&profile(99, "Augusta")))
    .await
    .unwrap();
  assert!(!second.was_created());
  assert_eq!(second.get().user_id, first.get().user_id);
  assert_eq!(second.get().first_name, "Ada");
  assert_eq!(count(&s, "users").await, 1);

  let dup = s
    .transact(|l| {
      l.conn.execute("INSERT INTO users (tid, first_name) VALUES (99, 'Dup')", [])?;
      Ok(())
    })
    .await;
  assert!(dup.is_err());
}

#[tokio::test]
async fn two_stores_on_one_file_share_rows() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tally.db");
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();
  let (circle, _) = seed(&a).await;

  // The second store's inserts all hit rows the first one already wrote.
  let from_a = member(&a, 7, "Ada", Some(circle.circle_id)).await;
  let from_b = b
    .transact(|l| l.provision_user(&profile(7, "Ada")))
    .await
    .unwrap();
  assert!(!from_b.was_created());
  assert_eq!(from_b.get().user_id, from_a.user_id);

  let (phase_a, stmt_a) = a
    .transact(move |l| statement::for_update(l, &from_a, at(14, 0), PhaseMode::Current))
    .await
    .unwrap();
  assert!(stmt_a.was_created());
  let user = from_b.into_inner();
  let (phase_b, stmt_b) = b
    .transact(move |l| statement::for_update(l, &user, at(15, 0), PhaseMode::Current))
    .await
    .unwrap();
  assert_eq!(phase_b.phase_id, phase_a.phase_id);
  assert!(!stmt_b.was_created());
  assert_eq!(stmt_b.get().statement_id, stmt_a.get().statement_id);
  assert_eq!(stmt_b.get().time, at(15, 0));

  assert_eq!(count(&a, "users").await, 1);
  assert_eq!(count(&a, "phases").await, 1);
  assert_eq!(count(&b, "statements").await, 1);
}

#[tokio::test]
async fn update_user_flags_only_touches_given_flags() {
  let s = store().await;
  member(&s, 5, "Ada", None).await;

  let updated = s
    .update_user_flags(5, UserFlags { reminder: Some(false), ..UserFlags::default() })
    .await
    .unwrap()
    .unwrap();
  assert!(!updated.reminder);
  assert!(updated.enabled);

  let missing = s.update_user_flags(6, UserFlags::default()).await.unwrap();
  assert!(missing.is_none());
}

// ─── Reminders ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn reminders_target_silent_opted_in_members() {
  let s = store().await;
  let (circle, moments) = seed(&s).await;
  let dinner = moments[1].moment_id;
  let voter = member(&s, 1, "Voter", Some(circle.circle_id)).await;
  member(&s, 2, "Silent", Some(circle.circle_id)).await;
  member(&s, 3, "OptedOut", Some(circle.circle_id)).await;
  member(&s, 4, "Disabled", Some(circle.circle_id)).await;
  s.update_user_flags(3, UserFlags { reminder: Some(false), ..UserFlags::default() })
    .await
    .unwrap();
  s.update_user_flags(4, UserFlags { enabled: Some(false), ..UserFlags::default() })
    .await
    .unwrap();

  // Before anybody resolved the phase, nothing exists and everybody is due.
  let due = s.read(move |l| reminder::due(l, dinner, at(20, 30))).await.unwrap();
  let names: Vec<_> = due.iter().map(|u| u.first_name.as_str()).collect();
  assert_eq!(names, ["Voter", "Silent"]);
  assert_eq!(count(&s, "phases").await, 0);

  s.transact(move |l| {
    statement::declare(l, &voter, at(20, 10), PhaseMode::Current, Choice::Absent)
  })
  .await
  .unwrap();

  let due = s.read(move |l| reminder::due(l, dinner, at(20, 30))).await.unwrap();
  let names: Vec<_> = due.iter().map(|u| u.first_name.as_str()).collect();
  assert_eq!(names, ["Silent"]);
}
