//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use coach_core::{
  access::{self, COMMUNITY_REQUIRED, NO_ACCESS, PREREQUISITE_REQUIRED},
  course::{AccessType, Course, NewCourse, NewLesson},
  error::{DeadlineAction, Rejection},
  event::{Event, NewEvent, RegistrationStatus},
  identity::{Actor, Role},
  notification::NotificationKind,
  store::{CoachStore, CourseQuery, EventQuery},
  workflow,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn instructor() -> Actor { Actor::new(Uuid::new_v4(), Role::Instructor) }

fn client() -> Actor { Actor::new(Uuid::new_v4(), Role::Client) }

/// A fixed "current time" well before every test event starts.
fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap() }

async fn course(s: &SqliteStore, owner: Actor, access_type: AccessType) -> Course {
  workflow::create_course(
    s,
    owner,
    NewCourse {
      title: "Kettlebell foundations".into(),
      access_type,
      is_published: true,
      ..Default::default()
    },
  )
  .await
  .unwrap()
  .unwrap()
}

async fn event(s: &SqliteStore, owner: Actor, max_attendees: Option<u32>, allow_waitlist: bool) -> Event {
  workflow::create_event(
    s,
    owner,
    NewEvent {
      title: "Park workout".into(),
      starts_at: Utc.with_ymd_and_hms(2026, 10, 20, 18, 0, 0).unwrap(),
      ends_at: Utc.with_ymd_and_hms(2026, 10, 20, 19, 0, 0).unwrap(),
      max_attendees,
      requires_registration: true,
      registration_deadline_hours: 12,
      allow_waitlist,
    },
  )
  .await
  .unwrap()
  .unwrap()
}

async fn confirmed_count(s: &SqliteStore, event_id: Uuid) -> usize {
  s.list_registrations(event_id)
    .await
    .unwrap()
    .iter()
    .filter(|r| r.status == RegistrationStatus::Confirmed)
    .count()
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_course() {
  let s = store().await;
  let owner = instructor();
  let c = course(&s, owner, AccessType::Sequential).await;

  let fetched = s.get_course(c.course_id).await.unwrap().unwrap();
  assert_eq!(fetched, c);
  assert_eq!(fetched.creator_id, owner.user_id);
}

#[tokio::test]
async fn clients_cannot_create_courses() {
  let s = store().await;
  let result = workflow::create_course(
    &s,
    client(),
    NewCourse { title: "Sneaky".into(), ..Default::default() },
  )
  .await
  .unwrap();
  assert!(matches!(result, Err(Rejection::Unauthorized(_))));
}

#[tokio::test]
async fn list_courses_hides_unpublished_from_others() {
  let s = store().await;
  let owner = instructor();
  course(&s, owner, AccessType::Open).await;
  workflow::create_course(
    &s,
    owner,
    NewCourse { title: "Draft".into(), ..Default::default() },
  )
  .await
  .unwrap()
  .unwrap();

  assert_eq!(s.list_courses(CourseQuery::default()).await.unwrap().len(), 1);
  assert_eq!(workflow::list_courses(&s, client()).await.unwrap().len(), 1);
  assert_eq!(workflow::list_courses(&s, owner).await.unwrap().len(), 2);
}

#[tokio::test]
async fn only_owner_or_admin_updates_course() {
  let s = store().await;
  let owner = instructor();
  let c = course(&s, owner, AccessType::Open).await;

  let update = coach_core::course::CourseUpdate {
    access_type: Some(AccessType::Private),
    ..Default::default()
  };
  let denied = workflow::update_course(&s, instructor(), c.course_id, update.clone())
    .await
    .unwrap();
  assert!(matches!(denied, Err(Rejection::Unauthorized(_))));

  let admin = Actor::new(Uuid::new_v4(), Role::SuperAdmin);
  let updated = workflow::update_course(&s, admin, c.course_id, update)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.access_type, AccessType::Private);
  assert_eq!(
    s.get_course(c.course_id).await.unwrap().unwrap().access_type,
    AccessType::Private
  );
}

#[tokio::test]
async fn delete_course_cascades_enrollments_and_lessons() {
  let s = store().await;
  let owner = instructor();
  let user = client();
  let c = course(&s, owner, AccessType::Open).await;
  let lesson = workflow::add_lesson(
    &s,
    owner,
    c.course_id,
    NewLesson { title: "Swing".into(), position: 1, is_published: true },
  )
  .await
  .unwrap()
  .unwrap();
  workflow::enroll(&s, user, c.course_id, now()).await.unwrap().unwrap();

  workflow::delete_course(&s, owner, c.course_id).await.unwrap().unwrap();

  assert!(s.get_course(c.course_id).await.unwrap().is_none());
  assert!(s.get_lesson(lesson.lesson_id).await.unwrap().is_none());
  assert!(s.get_enrollment(c.course_id, user.user_id).await.unwrap().is_none());
}

// ─── Access ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn open_course_is_accessible_to_anyone() {
  let s = store().await;
  let c = course(&s, instructor(), AccessType::Open).await;
  for _ in 0..3 {
    let decision = access::can_access(&s, Uuid::new_v4(), &c).await.unwrap();
    assert!(decision.allowed);
  }
}

#[tokio::test]
async fn sequential_course_unlocks_after_prerequisite_completion() {
  let s = store().await;
  let owner = instructor();
  let user = client();

  let c1 = course(&s, owner, AccessType::Open).await;
  let l1 = workflow::add_lesson(&s, owner, c1.course_id, NewLesson {
    title: "Hinge".into(),
    position: 1,
    is_published: true,
  })
  .await
  .unwrap()
  .unwrap();
  let l2 = workflow::add_lesson(&s, owner, c1.course_id, NewLesson {
    title: "Squat".into(),
    position: 2,
    is_published: true,
  })
  .await
  .unwrap()
  .unwrap();

  let mut c2 = course(&s, owner, AccessType::Sequential).await;
  c2.prerequisite_id = Some(c1.course_id);
  let c2 = s.update_course(c2).await.unwrap();

  // No enrollment in C1 at all.
  let denied = access::can_access(&s, user.user_id, &c2).await.unwrap();
  assert_eq!(denied.reason.as_deref(), Some(PREREQUISITE_REQUIRED));
  let attempt = workflow::enroll(&s, user, c2.course_id, now()).await.unwrap();
  assert_eq!(attempt, Err(Rejection::PolicyDenied(PREREQUISITE_REQUIRED.into())));
  assert!(s.get_enrollment(c2.course_id, user.user_id).await.unwrap().is_none());

  // Enrolled but not completed.
  workflow::enroll(&s, user, c1.course_id, now()).await.unwrap().unwrap();
  let partial = workflow::complete_lesson(&s, user, l1.lesson_id, now()).await.unwrap().unwrap();
  assert!(partial.completed_at.is_none());
  assert!(!access::can_access(&s, user.user_id, &c2).await.unwrap().allowed);

  // Completing every lesson stamps the enrollment.
  let done = workflow::complete_lesson(&s, user, l2.lesson_id, now()).await.unwrap().unwrap();
  assert_eq!(done.completed_at, Some(now()));
  assert!(access::can_access(&s, user.user_id, &c2).await.unwrap().allowed);
  workflow::enroll(&s, user, c2.course_id, now()).await.unwrap().unwrap();
}

#[tokio::test]
async fn unpublished_lessons_do_not_block_completion() {
  let s = store().await;
  let owner = instructor();
  let user = client();
  let c = course(&s, owner, AccessType::Open).await;

  let published = s
    .add_lesson(c.course_id, NewLesson { title: "Live".into(), position: 1, is_published: true })
    .await
    .unwrap();
  s.add_lesson(c.course_id, NewLesson { title: "Draft".into(), position: 2, is_published: false })
    .await
    .unwrap();

  workflow::enroll(&s, user, c.course_id, now()).await.unwrap().unwrap();
  let enrollment = workflow::complete_lesson(&s, user, published.lesson_id, now())
    .await
    .unwrap()
    .unwrap();
  assert!(enrollment.is_completed());
}

#[tokio::test]
async fn completing_a_lesson_requires_enrollment() {
  let s = store().await;
  let owner = instructor();
  let c = course(&s, owner, AccessType::Open).await;
  let lesson = s
    .add_lesson(c.course_id, NewLesson { title: "Press".into(), position: 0, is_published: true })
    .await
    .unwrap();

  let result = workflow::complete_lesson(&s, client(), lesson.lesson_id, now()).await.unwrap();
  assert!(matches!(result, Err(Rejection::PolicyDenied(_))));

  let missing = workflow::complete_lesson(&s, client(), Uuid::new_v4(), now()).await.unwrap();
  assert!(matches!(missing, Err(Rejection::NotFound(_))));
}

#[tokio::test]
async fn community_course_requires_membership() {
  let s = store().await;
  let owner = instructor();
  let user = client();

  let community = workflow::create_community(&s, owner, "Morning runners".into())
    .await
    .unwrap()
    .unwrap();
  let c = workflow::create_course(&s, owner, NewCourse {
    title: "5k plan".into(),
    access_type: AccessType::Community,
    community_id: Some(community.community_id),
    is_published: true,
    ..Default::default()
  })
  .await
  .unwrap()
  .unwrap();

  let denied = workflow::check_access(&s, user, c.course_id).await.unwrap().unwrap();
  assert_eq!(denied.reason.as_deref(), Some(COMMUNITY_REQUIRED));

  workflow::add_member(&s, user, community.community_id, user.user_id, now())
    .await
    .unwrap()
    .unwrap();
  assert!(workflow::check_access(&s, user, c.course_id).await.unwrap().unwrap().allowed);
}

#[tokio::test]
async fn adding_someone_else_to_a_community_requires_ownership() {
  let s = store().await;
  let owner = instructor();
  let community = workflow::create_community(&s, owner, "Lifters".into())
    .await
    .unwrap()
    .unwrap();

  let stranger = client();
  let result = workflow::add_member(&s, stranger, community.community_id, Uuid::new_v4(), now())
    .await
    .unwrap();
  assert!(matches!(result, Err(Rejection::Unauthorized(_))));

  let member = Uuid::new_v4();
  workflow::add_member(&s, owner, community.community_id, member, now())
    .await
    .unwrap()
    .unwrap();
  // Idempotent.
  workflow::add_member(&s, owner, community.community_id, member, now())
    .await
    .unwrap()
    .unwrap();
  assert!(s.is_member(community.community_id, member).await.unwrap());
}

#[tokio::test]
async fn private_course_only_admits_preprovisioned_users() {
  let s = store().await;
  let owner = instructor();
  let user = client();
  let c = course(&s, owner, AccessType::Private).await;

  let attempt = workflow::enroll(&s, user, c.course_id, now()).await.unwrap();
  assert_eq!(attempt, Err(Rejection::PolicyDenied(NO_ACCESS.into())));

  // Staff provisions the enrollment directly.
  s.enroll(c.course_id, user.user_id, now()).await.unwrap();
  assert!(access::can_access(&s, user.user_id, &c).await.unwrap().allowed);

  // Re-enrolling is an idempotent no-op.
  let again = workflow::enroll(&s, user, c.course_id, now()).await.unwrap().unwrap();
  assert_eq!(again.enrolled_at, now());
}

#[tokio::test]
async fn enrollment_requires_published_course() {
  let s = store().await;
  let owner = instructor();
  let draft = workflow::create_course(&s, owner, NewCourse {
    title: "Coming soon".into(),
    ..Default::default()
  })
  .await
  .unwrap()
  .unwrap();

  // Drafts stay hidden from everyone but their owner.
  let attempt = workflow::enroll(&s, client(), draft.course_id, now()).await.unwrap();
  assert_eq!(attempt, Err(Rejection::not_found("course")));
  let attempt = workflow::enroll(&s, instructor(), draft.course_id, now()).await.unwrap();
  assert_eq!(attempt, Err(Rejection::not_found("course")));

  let attempt = workflow::enroll(&s, owner, draft.course_id, now()).await.unwrap();
  assert_eq!(
    attempt,
    Err(Rejection::PolicyDenied("course is not open for enrollment".into()))
  );
}

#[tokio::test]
async fn enrolling_twice_notifies_once() {
  let s = store().await;
  let user = client();
  let c = course(&s, instructor(), AccessType::Open).await;

  workflow::enroll(&s, user, c.course_id, now()).await.unwrap().unwrap();
  workflow::enroll(&s, user, c.course_id, now() + Duration::hours(1))
    .await
    .unwrap()
    .unwrap();

  let notifications = s.list_notifications(user.user_id).await.unwrap();
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0].kind, NotificationKind::CourseEnrolled);
}

#[tokio::test]
async fn unenroll_removes_progress() {
  let s = store().await;
  let owner = instructor();
  let user = client();
  let c = course(&s, owner, AccessType::Open).await;
  let lesson = s
    .add_lesson(c.course_id, NewLesson { title: "Row".into(), position: 0, is_published: true })
    .await
    .unwrap();

  workflow::enroll(&s, user, c.course_id, now()).await.unwrap().unwrap();
  workflow::complete_lesson(&s, user, lesson.lesson_id, now()).await.unwrap().unwrap();
  workflow::unenroll(&s, user, c.course_id).await.unwrap().unwrap();

  // Re-enrolling starts from scratch: the course is not already complete.
  let fresh = workflow::enroll(&s, user, c.course_id, now()).await.unwrap().unwrap();
  assert!(fresh.completed_at.is_none());

  let second = workflow::unenroll(&s, client(), c.course_id).await.unwrap();
  assert!(matches!(second, Err(Rejection::NotFound(_))));
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn waitlist_promotion_scenario() {
  let s = store().await;
  let e = event(&s, instructor(), Some(2), true).await;
  let (u1, u2, u3) = (client(), client(), client());

  let r1 = workflow::register(&s, u1, e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(r1.status, RegistrationStatus::Confirmed);
  let r2 = workflow::register(&s, u2, e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(r2.status, RegistrationStatus::Confirmed);
  let r3 = workflow::register(&s, u3, e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(r3.status, RegistrationStatus::Waitlisted);

  let cancellation = workflow::cancel(&s, u1, e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(cancellation.cancelled.user_id, u1.user_id);
  let promoted = cancellation.promoted.expect("user3 promoted");
  assert_eq!(promoted.user_id, u3.user_id);
  assert_eq!(promoted.status, RegistrationStatus::Confirmed);

  let regs = s.list_registrations(e.event_id).await.unwrap();
  assert_eq!(regs.len(), 2);
  assert!(regs.iter().all(|r| r.status == RegistrationStatus::Confirmed));
  let users: Vec<_> = regs.iter().map(|r| r.user_id).collect();
  assert!(users.contains(&u2.user_id) && users.contains(&u3.user_id));

  let kinds: Vec<_> = s
    .list_notifications(u3.user_id)
    .await
    .unwrap()
    .into_iter()
    .map(|n| n.kind)
    .collect();
  assert_eq!(
    kinds,
    vec![NotificationKind::WaitlistPromoted, NotificationKind::RegistrationWaitlisted]
  );
}

#[tokio::test]
async fn full_event_without_waitlist_rejects() {
  let s = store().await;
  let e = event(&s, instructor(), Some(1), false).await;

  let first = workflow::register(&s, client(), e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(first.status, RegistrationStatus::Confirmed);

  let second = workflow::register(&s, client(), e.event_id, now()).await.unwrap();
  assert_eq!(second, Err(Rejection::CapacityExceeded));
  assert_eq!(s.list_registrations(e.event_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
  let s = store().await;
  let e = event(&s, instructor(), None, false).await;
  let user = client();

  workflow::register(&s, user, e.event_id, now()).await.unwrap().unwrap();
  let again = workflow::register(&s, user, e.event_id, now()).await.unwrap();
  assert_eq!(again, Err(Rejection::Conflict("already registered".into())));
  assert_eq!(s.list_registrations(e.event_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn registration_deadline_boundary() {
  let s = store().await;
  let e = event(&s, instructor(), None, false).await;
  let deadline = e.registration_deadline().unwrap();

  let on_time = workflow::register(&s, client(), e.event_id, deadline - Duration::seconds(1))
    .await
    .unwrap();
  assert!(on_time.is_ok());

  let late = workflow::register(&s, client(), e.event_id, deadline).await.unwrap();
  assert_eq!(
    late,
    Err(Rejection::DeadlinePassed { action: DeadlineAction::Registration, hours: 12 })
  );
}

#[tokio::test]
async fn unrepresentable_deadline_refuses_registration() {
  let s = store().await;
  let owner = instructor();
  let input = NewEvent {
    title: "Century plan".into(),
    starts_at: Utc.with_ymd_and_hms(2026, 10, 20, 18, 0, 0).unwrap(),
    ends_at: Utc.with_ymd_and_hms(2026, 10, 20, 19, 0, 0).unwrap(),
    max_attendees: None,
    requires_registration: true,
    registration_deadline_hours: u32::MAX,
    allow_waitlist: false,
  };

  let rejected = workflow::create_event(&s, owner, input.clone()).await.unwrap();
  assert!(matches!(rejected, Err(Rejection::Invalid(_))), "{rejected:?}");

  // A row that skipped validation must not take the connection down.
  let e = s.create_event(owner.user_id, input).await.unwrap();
  let late = workflow::register(&s, client(), e.event_id, now()).await.unwrap();
  assert_eq!(
    late,
    Err(Rejection::DeadlinePassed { action: DeadlineAction::Registration, hours: u32::MAX })
  );

  let events = s.list_events(EventQuery::default()).await.unwrap();
  assert_eq!(events.len(), 1);
  let fine = event(&s, owner, None, false).await;
  assert!(workflow::register(&s, client(), fine.event_id, now()).await.unwrap().is_ok());
}

#[tokio::test]
async fn confirmed_cancellation_closes_at_deadline() {
  let s = store().await;
  let e = event(&s, instructor(), Some(1), true).await;
  let (holder, waiting) = (client(), client());

  workflow::register(&s, holder, e.event_id, now()).await.unwrap().unwrap();
  workflow::register(&s, waiting, e.event_id, now()).await.unwrap().unwrap();

  let late = e.registration_deadline().unwrap() + Duration::minutes(5);
  let refused = workflow::cancel(&s, holder, e.event_id, late).await.unwrap().unwrap_err();
  assert!(refused.to_string().contains("12 hours"), "{refused}");
  assert!(s.get_registration(e.event_id, holder.user_id).await.unwrap().is_some());

  // Waitlisted users can always leave, and that promotes nobody.
  let left = workflow::cancel(&s, waiting, e.event_id, late).await.unwrap().unwrap();
  assert!(left.promoted.is_none());
  assert_eq!(confirmed_count(&s, e.event_id).await, 1);
}

#[tokio::test]
async fn cancelling_without_registration_is_not_found() {
  let s = store().await;
  let e = event(&s, instructor(), Some(3), true).await;
  let result = workflow::cancel(&s, client(), e.event_id, now()).await.unwrap();
  assert!(matches!(result, Err(Rejection::NotFound(_))));

  let no_event = workflow::register(&s, client(), Uuid::new_v4(), now()).await.unwrap();
  assert!(matches!(no_event, Err(Rejection::NotFound(_))));
}

#[tokio::test]
async fn waitlist_is_first_in_first_out() {
  let s = store().await;
  let e = event(&s, instructor(), Some(1), true).await;
  let (holder, a, b) = (client(), client(), client());

  workflow::register(&s, holder, e.event_id, now()).await.unwrap().unwrap();
  workflow::register(&s, a, e.event_id, now() + Duration::minutes(1)).await.unwrap().unwrap();
  workflow::register(&s, b, e.event_id, now() + Duration::minutes(2)).await.unwrap().unwrap();

  let cancellation = workflow::cancel(&s, holder, e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(cancellation.promoted.map(|r| r.user_id), Some(a.user_id));

  let b_reg = s.get_registration(e.event_id, b.user_id).await.unwrap().unwrap();
  assert_eq!(b_reg.status, RegistrationStatus::Waitlisted);
}

#[tokio::test]
async fn waitlist_ties_break_by_insertion_order() {
  let s = store().await;
  let e = event(&s, instructor(), Some(1), true).await;
  let holder = client();
  let queue: Vec<_> = (0..4).map(|_| client()).collect();

  workflow::register(&s, holder, e.event_id, now()).await.unwrap().unwrap();
  for user in &queue {
    workflow::register(&s, *user, e.event_id, now()).await.unwrap().unwrap();
  }

  let cancellation = workflow::cancel(&s, holder, e.event_id, now()).await.unwrap().unwrap();
  assert_eq!(cancellation.promoted.map(|r| r.user_id), Some(queue[0].user_id));
}

#[tokio::test]
async fn lowered_capacity_blocks_promotion() {
  let s = store().await;
  let owner = instructor();
  let e = event(&s, owner, Some(3), true).await;
  let users: Vec<_> = (0..4).map(|_| client()).collect();
  for user in &users {
    workflow::register(&s, *user, e.event_id, now()).await.unwrap().unwrap();
  }

  let update = coach_core::event::EventUpdate {
    max_attendees: Some(Some(1)),
    ..Default::default()
  };
  workflow::update_event(&s, owner, e.event_id, update).await.unwrap().unwrap();

  // Two confirmed remain after this, still above the new limit of one.
  let cancellation = workflow::cancel(&s, users[0], e.event_id, now()).await.unwrap().unwrap();
  assert!(cancellation.promoted.is_none());
  assert_eq!(confirmed_count(&s, e.event_id).await, 2);
}

#[tokio::test]
async fn capacity_holds_under_concurrent_registration() {
  let s = store().await;
  let e = event(&s, instructor(), Some(3), true).await;

  let handles: Vec<_> = (0..20)
    .map(|_| {
      let s = s.clone();
      let event_id = e.event_id;
      tokio::spawn(async move { workflow::register(&s, client(), event_id, now()).await })
    })
    .collect();

  for handle in handles {
    handle.await.unwrap().unwrap().unwrap();
  }

  let regs = s.list_registrations(e.event_id).await.unwrap();
  assert_eq!(regs.len(), 20);
  assert_eq!(confirmed_count(&s, e.event_id).await, 3);
}

#[tokio::test]
async fn capacity_invariant_over_mixed_operations() {
  let s = store().await;
  let e = event(&s, instructor(), Some(2), true).await;
  let users: Vec<_> = (0..6).map(|_| client()).collect();

  for (i, user) in users.iter().enumerate() {
    workflow::register(&s, *user, e.event_id, now() + Duration::seconds(i as i64))
      .await
      .unwrap()
      .unwrap();
    assert!(confirmed_count(&s, e.event_id).await <= 2);
  }
  for user in users.iter().step_by(2) {
    workflow::cancel(&s, *user, e.event_id, now()).await.unwrap().unwrap();
    assert!(confirmed_count(&s, e.event_id).await <= 2);
  }

  assert_eq!(confirmed_count(&s, e.event_id).await, 2);
  assert_eq!(s.list_registrations(e.event_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn only_creator_or_admin_manages_events() {
  let s = store().await;
  let owner = instructor();
  let e = event(&s, owner, Some(5), false).await;

  let other = instructor();
  let denied = workflow::delete_event(&s, other, e.event_id).await.unwrap();
  assert!(matches!(denied, Err(Rejection::Unauthorized(_))));
  let hidden = workflow::list_registrations(&s, client(), e.event_id).await.unwrap();
  assert!(matches!(hidden, Err(Rejection::Unauthorized(_))));

  workflow::register(&s, client(), e.event_id, now()).await.unwrap().unwrap();
  workflow::delete_event(&s, owner, e.event_id).await.unwrap().unwrap();
  assert!(s.get_event(e.event_id).await.unwrap().is_none());
  assert!(s.list_registrations(e.event_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_events_filters_past_events() {
  let s = store().await;
  let owner = instructor();
  event(&s, owner, None, false).await;

  let upcoming = s
    .list_events(EventQuery { ends_after: Some(now()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(upcoming.len(), 1);

  let later = s
    .list_events(EventQuery {
      ends_after: Some(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(later.is_empty());

  let unbounded = s
    .list_events(EventQuery { limit: Some(usize::MAX), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(unbounded.len(), 1);
  let none = s
    .list_events(EventQuery { limit: Some(0), ..Default::default() })
    .await
    .unwrap();
  assert!(none.is_empty());
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_are_private_and_markable() {
  let s = store().await;
  let e = event(&s, instructor(), None, false).await;
  let user = client();
  workflow::register(&s, user, e.event_id, now()).await.unwrap().unwrap();

  let list = s.list_notifications(user.user_id).await.unwrap();
  assert_eq!(list.len(), 1);
  assert_eq!(list[0].kind, NotificationKind::RegistrationConfirmed);
  assert!(list[0].body.contains("Park workout"));

  let id = list[0].notification_id;
  assert!(s.mark_notification_read(id, Uuid::new_v4(), now()).await.unwrap().is_none());

  let read = s.mark_notification_read(id, user.user_id, now()).await.unwrap().unwrap();
  assert_eq!(read.read_at, Some(now()));
}
