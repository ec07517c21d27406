//! Request-level operations: authorization, validation, the policy call,
//! the write, and the notification side effect.
//!
//! Every function returns `Result<Decision<T>, S::Error>`. The outer error
//! is a store failure; the inner [`Rejection`] is an expected refusal that
//! is reported to the caller as-is. Notifications are best-effort: a
//! failure to store one is logged and otherwise ignored.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  access::{self, AccessDecision},
  community::{Community, Membership},
  course::{Course, CourseEnrollment, CourseUpdate, Lesson, NewCourse, NewLesson},
  error::{Decision, Rejection},
  event::{Cancellation, Event, EventUpdate, NewEvent, Registration, RegistrationStatus},
  identity::Actor,
  notification::NewNotification,
  store::CoachStore,
};

/// Unwrap a [`Decision`], returning the rejection from the enclosing
/// workflow.
macro_rules! decide {
  ($decision:expr) => {
    match $decision {
      Ok(v) => v,
      Err(rejection) => return Ok(Err(rejection)),
    }
  };
}

async fn notify<S: CoachStore>(store: &S, notification: NewNotification) {
  let kind = notification.kind;
  let user_id = notification.user_id;
  if let Err(e) = store.create_notification(notification).await {
    tracing::warn!(%user_id, %kind, error = %e, "failed to store notification");
  }
}

async fn find_course<S: CoachStore>(store: &S, id: Uuid) -> Result<Decision<Course>, S::Error> {
  Ok(store.get_course(id).await?.ok_or_else(|| Rejection::not_found("course")))
}

async fn find_event<S: CoachStore>(store: &S, id: Uuid) -> Result<Decision<Event>, S::Error> {
  Ok(store.get_event(id).await?.ok_or_else(|| Rejection::not_found("event")))
}

/// Referenced prerequisite and community must exist.
async fn check_course_refs<S: CoachStore>(
  store: &S,
  course_id: Option<Uuid>,
  prerequisite_id: Option<Uuid>,
  community_id: Option<Uuid>,
) -> Result<Decision<()>, S::Error> {
  if let Some(prerequisite_id) = prerequisite_id {
    if Some(prerequisite_id) == course_id {
      return Ok(Err(Rejection::Invalid("a course cannot be its own prerequisite".into())));
    }
    if store.get_course(prerequisite_id).await?.is_none() {
      return Ok(Err(Rejection::Invalid("prerequisite course does not exist".into())));
    }
  }
  if let Some(community_id) = community_id
    && store.get_community(community_id).await?.is_none()
  {
    return Ok(Err(Rejection::Invalid("community does not exist".into())));
  }
  Ok(Ok(()))
}

// ─── Courses ─────────────────────────────────────────────────────────────────

pub async fn create_course<S: CoachStore>(
  store: &S,
  actor: Actor,
  input: NewCourse,
) -> Result<Decision<Course>, S::Error> {
  decide!(actor.require_staff());
  decide!(input.validate());
  decide!(check_course_refs(store, None, input.prerequisite_id, input.community_id).await?);

  let course = store.create_course(actor.user_id, input).await?;
  tracing::info!(course_id = %course.course_id, access = %course.access_type, "course created");
  Ok(Ok(course))
}

/// Courses visible to `actor`: published ones, plus everything they
/// authored. Super admins see everything.
pub async fn list_courses<S: CoachStore>(store: &S, actor: Actor) -> Result<Vec<Course>, S::Error> {
  use crate::store::CourseQuery;

  if actor.is_admin() {
    return store
      .list_courses(CourseQuery { include_unpublished: true, ..Default::default() })
      .await;
  }

  let mut courses = store.list_courses(CourseQuery::default()).await?;
  let own = store
    .list_courses(CourseQuery { creator_id: Some(actor.user_id), include_unpublished: true })
    .await?;
  for course in own {
    if !courses.iter().any(|c| c.course_id == course.course_id) {
      courses.push(course);
    }
  }
  Ok(courses)
}

/// Unpublished courses are only visible to their author and admins; to
/// everyone else they do not exist.
pub async fn get_course<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
) -> Result<Decision<Course>, S::Error> {
  let course = decide!(find_course(store, course_id).await?);
  if !course.is_published && actor.require_owner(course.creator_id).is_err() {
    return Ok(Err(Rejection::not_found("course")));
  }
  Ok(Ok(course))
}

pub async fn update_course<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
  update: CourseUpdate,
) -> Result<Decision<Course>, S::Error> {
  let mut course = decide!(find_course(store, course_id).await?);
  decide!(actor.require_owner(course.creator_id));
  decide!(update.validate(course_id));

  update.apply(&mut course);
  decide!(
    check_course_refs(store, Some(course_id), course.prerequisite_id, course.community_id).await?
  );

  Ok(Ok(store.update_course(course).await?))
}

pub async fn delete_course<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
) -> Result<Decision<()>, S::Error> {
  let course = decide!(find_course(store, course_id).await?);
  decide!(actor.require_owner(course.creator_id));

  store.delete_course(course_id).await?;
  tracing::info!(%course_id, "course deleted");
  Ok(Ok(()))
}

pub async fn add_lesson<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
  input: NewLesson,
) -> Result<Decision<Lesson>, S::Error> {
  let course = decide!(find_course(store, course_id).await?);
  decide!(actor.require_owner(course.creator_id));
  if input.title.trim().is_empty() {
    return Ok(Err(Rejection::Invalid("title must not be empty".into())));
  }

  Ok(Ok(store.add_lesson(course_id, input).await?))
}

/// Lessons in position order. Only the author and admins see unpublished
/// lessons.
pub async fn list_lessons<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
) -> Result<Decision<Vec<Lesson>>, S::Error> {
  let course = decide!(get_course(store, actor, course_id).await?);
  let mut lessons = store.list_lessons(course_id).await?;
  if actor.require_owner(course.creator_id).is_err() {
    lessons.retain(|l| l.is_published);
  }
  Ok(Ok(lessons))
}

/// The access decision for `actor` on a course, without enrolling.
pub async fn check_access<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
) -> Result<Decision<AccessDecision>, S::Error> {
  let course = decide!(get_course(store, actor, course_id).await?);
  Ok(Ok(access::can_access(store, actor.user_id, &course).await?))
}

/// Enroll `actor` in a course after the access check. Re-enrolling returns
/// the existing enrollment.
pub async fn enroll<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
  now: DateTime<Utc>,
) -> Result<Decision<CourseEnrollment>, S::Error> {
  let course = decide!(get_course(store, actor, course_id).await?);

  let decision = access::can_access(store, actor.user_id, &course).await?;
  if !decision.allowed {
    let reason = decision.reason.unwrap_or_else(|| access::NO_ACCESS.to_owned());
    return Ok(Err(Rejection::PolicyDenied(reason)));
  }
  if !course.is_enrollable() {
    return Ok(Err(Rejection::denied("course is not open for enrollment")));
  }

  let enrolled = store.enroll(course_id, actor.user_id, now).await?;
  if enrolled.created {
    tracing::info!(%course_id, user_id = %actor.user_id, "enrolled");
    notify(store, NewNotification::course_enrolled(actor.user_id, &course)).await;
  }
  Ok(Ok(enrolled.enrollment))
}

pub async fn unenroll<S: CoachStore>(
  store: &S,
  actor: Actor,
  course_id: Uuid,
) -> Result<Decision<()>, S::Error> {
  if !store.unenroll(course_id, actor.user_id).await? {
    return Ok(Err(Rejection::not_found("enrollment")));
  }
  tracing::info!(%course_id, user_id = %actor.user_id, "unenrolled");
  Ok(Ok(()))
}

pub async fn complete_lesson<S: CoachStore>(
  store: &S,
  actor: Actor,
  lesson_id: Uuid,
  now: DateTime<Utc>,
) -> Result<Decision<CourseEnrollment>, S::Error> {
  let enrollment = decide!(store.complete_lesson(lesson_id, actor.user_id, now).await?);
  if enrollment.completed_at == Some(now) {
    tracing::info!(course_id = %enrollment.course_id, user_id = %actor.user_id, "course completed");
  }
  Ok(Ok(enrollment))
}

// ─── Communities ─────────────────────────────────────────────────────────────

pub async fn create_community<S: CoachStore>(
  store: &S,
  actor: Actor,
  name: String,
) -> Result<Decision<Community>, S::Error> {
  decide!(actor.require_staff());
  if name.trim().is_empty() {
    return Ok(Err(Rejection::Invalid("name must not be empty".into())));
  }
  Ok(Ok(store.create_community(actor.user_id, name).await?))
}

/// Users may join a community themselves; adding someone else requires
/// owning the community.
pub async fn add_member<S: CoachStore>(
  store: &S,
  actor: Actor,
  community_id: Uuid,
  user_id: Uuid,
  now: DateTime<Utc>,
) -> Result<Decision<Membership>, S::Error> {
  let community = decide!(
    store
      .get_community(community_id)
      .await?
      .ok_or_else(|| Rejection::not_found("community"))
  );
  if user_id != actor.user_id {
    decide!(actor.require_owner(community.owner_id));
  }
  Ok(Ok(store.add_member(community_id, user_id, now).await?))
}

// ─── Events ──────────────────────────────────────────────────────────────────

pub async fn create_event<S: CoachStore>(
  store: &S,
  actor: Actor,
  input: NewEvent,
) -> Result<Decision<Event>, S::Error> {
  decide!(actor.require_staff());
  decide!(input.validate());

  let event = store.create_event(actor.user_id, input).await?;
  tracing::info!(event_id = %event.event_id, max_attendees = ?event.max_attendees, "event created");
  Ok(Ok(event))
}

pub async fn update_event<S: CoachStore>(
  store: &S,
  actor: Actor,
  event_id: Uuid,
  update: EventUpdate,
) -> Result<Decision<Event>, S::Error> {
  let mut event = decide!(find_event(store, event_id).await?);
  decide!(actor.require_owner(event.creator_id));
  decide!(update.apply(&mut event));

  Ok(Ok(store.update_event(event).await?))
}

pub async fn delete_event<S: CoachStore>(
  store: &S,
  actor: Actor,
  event_id: Uuid,
) -> Result<Decision<()>, S::Error> {
  let event = decide!(find_event(store, event_id).await?);
  decide!(actor.require_owner(event.creator_id));

  store.delete_event(event_id).await?;
  tracing::info!(%event_id, "event deleted");
  Ok(Ok(()))
}

/// Only the event's creator or an admin may see who registered.
pub async fn list_registrations<S: CoachStore>(
  store: &S,
  actor: Actor,
  event_id: Uuid,
) -> Result<Decision<Vec<Registration>>, S::Error> {
  let event = decide!(find_event(store, event_id).await?);
  decide!(actor.require_owner(event.creator_id));
  Ok(Ok(store.list_registrations(event_id).await?))
}

pub async fn register<S: CoachStore>(
  store: &S,
  actor: Actor,
  event_id: Uuid,
  now: DateTime<Utc>,
) -> Result<Decision<Registration>, S::Error> {
  let event = decide!(find_event(store, event_id).await?);
  let registration = decide!(store.register(event_id, actor.user_id, now).await?);

  tracing::info!(
    %event_id,
    user_id = %actor.user_id,
    status = %registration.status,
    "registered for event"
  );
  let notification = match registration.status {
    RegistrationStatus::Confirmed => NewNotification::registration_confirmed(actor.user_id, &event),
    RegistrationStatus::Waitlisted => {
      NewNotification::registration_waitlisted(actor.user_id, &event)
    }
  };
  notify(store, notification).await;

  Ok(Ok(registration))
}

pub async fn cancel<S: CoachStore>(
  store: &S,
  actor: Actor,
  event_id: Uuid,
  now: DateTime<Utc>,
) -> Result<Decision<Cancellation>, S::Error> {
  let event = decide!(find_event(store, event_id).await?);
  let cancellation = decide!(store.cancel(event_id, actor.user_id, now).await?);

  tracing::info!(%event_id, user_id = %actor.user_id, "registration cancelled");
  if let Some(promoted) = &cancellation.promoted {
    tracing::info!(%event_id, user_id = %promoted.user_id, "promoted from waitlist");
    notify(store, NewNotification::waitlist_promoted(promoted.user_id, &event)).await;
  }

  Ok(Ok(cancellation))
}
