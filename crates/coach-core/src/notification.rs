//! In-app notifications produced as side effects of enrollment and event
//! registration.
//!
//! Notifications are fire-and-forget: no operation's result depends on
//! whether its notification was stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{course::Course, event::Event};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
  RegistrationConfirmed,
  RegistrationWaitlisted,
  WaitlistPromoted,
  CourseEnrolled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub user_id:         Uuid,
  pub kind:            NotificationKind,
  pub title:           String,
  pub body:            String,
  pub created_at:      DateTime<Utc>,
  pub read_at:         Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
  pub user_id: Uuid,
  pub kind:    NotificationKind,
  pub title:   String,
  pub body:    String,
}

impl NewNotification {
  pub fn registration_confirmed(user_id: Uuid, event: &Event) -> Self {
    Self {
      user_id,
      kind: NotificationKind::RegistrationConfirmed,
      title: "Registration confirmed".into(),
      body: format!("You're registered for \"{}\".", event.title),
    }
  }

  pub fn registration_waitlisted(user_id: Uuid, event: &Event) -> Self {
    Self {
      user_id,
      kind: NotificationKind::RegistrationWaitlisted,
      title: "Added to waitlist".into(),
      body: format!(
        "\"{}\" is full. You're on the waitlist and will be notified if a spot opens.",
        event.title
      ),
    }
  }

  pub fn waitlist_promoted(user_id: Uuid, event: &Event) -> Self {
    Self {
      user_id,
      kind: NotificationKind::WaitlistPromoted,
      title: "A spot opened up".into(),
      body: format!("A spot opened in \"{}\" and you're now registered.", event.title),
    }
  }

  pub fn course_enrolled(user_id: Uuid, course: &Course) -> Self {
    Self {
      user_id,
      kind: NotificationKind::CourseEnrolled,
      title: "Enrolled".into(),
      body: format!("You're enrolled in \"{}\".", course.title),
    }
  }
}
