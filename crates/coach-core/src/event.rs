//! Events and event registrations.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::{Decision, Rejection};

/// Upper bound on `registration_deadline_hours`: one hundred years.
pub const MAX_DEADLINE_HOURS: u32 = 24 * 365 * 100;

// ─── Event ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub event_id:                    Uuid,
  pub title:                       String,
  pub starts_at:                   DateTime<Utc>,
  pub ends_at:                     DateTime<Utc>,
  /// Upper bound on confirmed registrations; `None` means unlimited.
  pub max_attendees:               Option<u32>,
  pub requires_registration:       bool,
  /// Registration (and cancellation of a confirmed spot) closes this many
  /// hours before `starts_at`.
  pub registration_deadline_hours: u32,
  pub allow_waitlist:              bool,
  pub creator_id:                  Uuid,
  pub created_at:                  DateTime<Utc>,
}

impl Event {
  /// The instant from which registration and confirmed-spot cancellation
  /// are refused, or `None` if it falls outside the representable range.
  pub fn registration_deadline(&self) -> Option<DateTime<Utc>> {
    TimeDelta::try_hours(i64::from(self.registration_deadline_hours))
      .and_then(|lead| self.starts_at.checked_sub_signed(lead))
  }

  /// Whether the registration window is closed at `now`. Events that do
  /// not require registration have no window. A deadline too far back to
  /// represent counts as already passed.
  pub fn window_closed(&self, now: DateTime<Utc>) -> bool {
    self.requires_registration
      && self.registration_deadline().is_none_or(|deadline| now >= deadline)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub title:                       String,
  pub starts_at:                   DateTime<Utc>,
  pub ends_at:                     DateTime<Utc>,
  pub max_attendees:               Option<u32>,
  #[serde(default = "default_true")]
  pub requires_registration:       bool,
  #[serde(default)]
  pub registration_deadline_hours: u32,
  #[serde(default)]
  pub allow_waitlist:              bool,
}

fn default_true() -> bool { true }

impl NewEvent {
  pub fn validate(&self) -> Decision<()> {
    validate_fields(
      &self.title,
      self.starts_at,
      self.ends_at,
      self.max_attendees,
      self.registration_deadline_hours,
    )
  }
}

/// A partial update; `max_attendees: Some(None)` removes the capacity limit.
///
/// Changing capacity never demotes confirmed registrations nor promotes
/// waitlisted ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
  pub title:                       Option<String>,
  pub starts_at:                   Option<DateTime<Utc>>,
  pub ends_at:                     Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "nullable")]
  pub max_attendees:               Option<Option<u32>>,
  pub requires_registration:       Option<bool>,
  pub registration_deadline_hours: Option<u32>,
  pub allow_waitlist:              Option<bool>,
}

fn nullable<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: serde::Deserializer<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

impl EventUpdate {
  /// Apply the update to `event` and validate the result.
  pub fn apply(self, event: &mut Event) -> Decision<()> {
    if let Some(title) = self.title {
      event.title = title;
    }
    if let Some(starts_at) = self.starts_at {
      event.starts_at = starts_at;
    }
    if let Some(ends_at) = self.ends_at {
      event.ends_at = ends_at;
    }
    if let Some(max_attendees) = self.max_attendees {
      event.max_attendees = max_attendees;
    }
    if let Some(requires_registration) = self.requires_registration {
      event.requires_registration = requires_registration;
    }
    if let Some(hours) = self.registration_deadline_hours {
      event.registration_deadline_hours = hours;
    }
    if let Some(allow_waitlist) = self.allow_waitlist {
      event.allow_waitlist = allow_waitlist;
    }
    validate_fields(
      &event.title,
      event.starts_at,
      event.ends_at,
      event.max_attendees,
      event.registration_deadline_hours,
    )
  }
}

fn validate_fields(
  title: &str,
  starts_at: DateTime<Utc>,
  ends_at: DateTime<Utc>,
  max_attendees: Option<u32>,
  deadline_hours: u32,
) -> Decision<()> {
  if title.trim().is_empty() {
    return Err(Rejection::Invalid("title must not be empty".into()));
  }
  if ends_at < starts_at {
    return Err(Rejection::Invalid("event must end after it starts".into()));
  }
  if max_attendees == Some(0) {
    return Err(Rejection::Invalid("max_attendees must be at least 1".into()));
  }
  if deadline_hours > MAX_DEADLINE_HOURS {
    return Err(Rejection::Invalid(format!(
      "registration_deadline_hours must be at most {MAX_DEADLINE_HOURS}"
    )));
  }
  Ok(())
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Whether a registration holds a seat or is queued for one.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum RegistrationStatus {
  #[serde(rename = "REGISTERED")]
  #[strum(serialize = "REGISTERED")]
  Confirmed,
  #[serde(rename = "WAITLIST")]
  #[strum(serialize = "WAITLIST")]
  Waitlisted,
}

impl RegistrationStatus {
  pub fn is_waitlisted(self) -> bool { self == Self::Waitlisted }
}

/// At most one per `(event_id, user_id)`. Waitlisted registrations are
/// served in `created_at` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
  pub event_id:   Uuid,
  pub user_id:    Uuid,
  pub status:     RegistrationStatus,
  pub created_at: DateTime<Utc>,
}

/// The result of a successful cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cancellation {
  pub cancelled: Registration,
  /// The waitlisted registration that took the freed seat, if any.
  pub promoted:  Option<Registration>,
}
