//! The `CoachStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `coach-store-sqlite`).
//! Higher layers (`coach-api`, the workflows in [`crate::workflow`]) depend
//! on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  community::{Community, Membership},
  course::{Course, CourseEnrollment, Enrolled, Lesson, NewCourse, NewLesson},
  error::Decision,
  event::{Cancellation, Event, NewEvent, Registration},
  notification::{NewNotification, Notification},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`CoachStore::list_courses`].
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
  /// Restrict to courses authored by this user.
  pub creator_id:          Option<Uuid>,
  /// Include unpublished and archived courses.
  pub include_unpublished: bool,
}

/// Parameters for [`CoachStore::list_events`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  /// Only events ending at or after this instant.
  pub ends_after: Option<DateTime<Utc>>,
  pub creator_id: Option<Uuid>,
  pub limit:      Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a coaching-platform store backend.
///
/// Plain reads and writes return `Result<T, Self::Error>`, where the error
/// is always fatal to the request. Operations that make a policy decision
/// return `Result<Decision<T>, Self::Error>`: the inner
/// [`Rejection`](crate::error::Rejection) is an expected outcome.
///
/// [`register`](Self::register), [`cancel`](Self::cancel) and
/// [`complete_lesson`](Self::complete_lesson) must be atomic with respect
/// to every other operation on the same event or enrollment.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait CoachStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Courses ───────────────────────────────────────────────────────────

  fn create_course(
    &self,
    creator_id: Uuid,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  /// Retrieve a course by UUID. Returns `None` if not found.
  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses(
    &self,
    query: CourseQuery,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  /// Overwrite every mutable column of an existing course.
  fn update_course(
    &self,
    course: Course,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  /// Delete a course with its lessons, enrollments and lesson progress.
  /// Returns `false` if it did not exist.
  fn delete_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Lessons ───────────────────────────────────────────────────────────

  fn add_lesson(
    &self,
    course_id: Uuid,
    input: NewLesson,
  ) -> impl Future<Output = Result<Lesson, Self::Error>> + Send + '_;

  fn get_lesson(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Lesson>, Self::Error>> + Send + '_;

  /// Lessons of a course ordered by position.
  fn list_lessons(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Lesson>, Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  fn get_enrollment(
    &self,
    course_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<CourseEnrollment>, Self::Error>> + Send + '_;

  /// Idempotent: an existing enrollment is returned unchanged.
  fn enroll(
    &self,
    course_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Enrolled, Self::Error>> + Send + '_;

  /// Remove an enrollment and the user's lesson progress in that course.
  /// Returns `false` if there was no enrollment.
  fn unenroll(
    &self,
    course_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record that `user_id` finished `lesson_id` and, if every published
  /// lesson of the course is now finished, stamp the enrollment complete.
  ///
  /// Rejects if the lesson does not exist or the user is not enrolled.
  fn complete_lesson(
    &self,
    lesson_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Decision<CourseEnrollment>, Self::Error>> + Send + '_;

  // ── Communities ───────────────────────────────────────────────────────

  fn create_community(
    &self,
    owner_id: Uuid,
    name: String,
  ) -> impl Future<Output = Result<Community, Self::Error>> + Send + '_;

  fn get_community(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Community>, Self::Error>> + Send + '_;

  /// Idempotent: an existing membership is returned unchanged.
  fn add_member(
    &self,
    community_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Membership, Self::Error>> + Send + '_;

  fn is_member(
    &self,
    community_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  fn create_event(
    &self,
    creator_id: Uuid,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// Events ordered by start time.
  fn list_events(
    &self,
    query: EventQuery,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  fn update_event(
    &self,
    event: Event,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Delete an event and all its registrations. Returns `false` if it did
  /// not exist.
  fn delete_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Registrations ─────────────────────────────────────────────────────

  fn get_registration(
    &self,
    event_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Registration>, Self::Error>> + Send + '_;

  /// Confirmed registrations first, then the waitlist in queue order.
  fn list_registrations(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Registration>, Self::Error>> + Send + '_;

  /// Register `user_id` for `event_id`, deciding the status with
  /// [`crate::registration::admit`] under the event's lock.
  fn register(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Decision<Registration>, Self::Error>> + Send + '_;

  /// Withdraw `user_id` from `event_id` and, when a confirmed seat frees
  /// up, promote the next waitlisted registration, all under the event's
  /// lock.
  fn cancel(
    &self,
    event_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Decision<Cancellation>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn create_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// A user's notifications, newest first.
  fn list_notifications(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Mark a notification read. Returns `None` if it does not exist or
  /// belongs to someone else.
  fn mark_notification_read(
    &self,
    id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Notification>, Self::Error>> + Send + '_;
}
