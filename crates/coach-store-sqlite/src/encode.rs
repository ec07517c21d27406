//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with exactly six fractional
//! digits and a `Z` suffix, so that string order is time order. Enums are
//! stored under their wire names. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use coach_core::{
  community::{Community, Membership},
  course::{AccessType, Course, CourseEnrollment, Lesson},
  error::parse_variant,
  event::{Event, Registration, RegistrationStatus},
  notification::{Notification, NotificationKind},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Truncate to the precision the store keeps.
pub fn stored_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const COURSE_COLUMNS: &str = "course_id, title, description, access_type, prerequisite_id, \
                                  community_id, creator_id, is_published, is_archived, created_at";

/// Raw values read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:       String,
  pub title:           String,
  pub description:     Option<String>,
  pub access_type:     String,
  pub prerequisite_id: Option<String>,
  pub community_id:    Option<String>,
  pub creator_id:      String,
  pub is_published:    bool,
  pub is_archived:     bool,
  pub created_at:      String,
}

impl RawCourse {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:       row.get(0)?,
      title:           row.get(1)?,
      description:     row.get(2)?,
      access_type:     row.get(3)?,
      prerequisite_id: row.get(4)?,
      community_id:    row.get(5)?,
      creator_id:      row.get(6)?,
      is_published:    row.get(7)?,
      is_archived:     row.get(8)?,
      created_at:      row.get(9)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:       decode_uuid(&self.course_id)?,
      title:           self.title,
      description:     self.description,
      access_type:     parse_variant::<AccessType>("access type", &self.access_type)?,
      prerequisite_id: decode_opt_uuid(self.prerequisite_id)?,
      community_id:    decode_opt_uuid(self.community_id)?,
      creator_id:      decode_uuid(&self.creator_id)?,
      is_published:    self.is_published,
      is_archived:     self.is_archived,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

pub const LESSON_COLUMNS: &str =
  "lesson_id, course_id, title, position, is_published, created_at";

pub struct RawLesson {
  pub lesson_id:    String,
  pub course_id:    String,
  pub title:        String,
  pub position:     u32,
  pub is_published: bool,
  pub created_at:   String,
}

impl RawLesson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lesson_id:    row.get(0)?,
      course_id:    row.get(1)?,
      title:        row.get(2)?,
      position:     row.get(3)?,
      is_published: row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_lesson(self) -> Result<Lesson> {
    Ok(Lesson {
      lesson_id:    decode_uuid(&self.lesson_id)?,
      course_id:    decode_uuid(&self.course_id)?,
      title:        self.title,
      position:     self.position,
      is_published: self.is_published,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const ENROLLMENT_COLUMNS: &str = "course_id, user_id, enrolled_at, completed_at";

pub struct RawEnrollment {
  pub course_id:    String,
  pub user_id:      String,
  pub enrolled_at:  String,
  pub completed_at: Option<String>,
}

impl RawEnrollment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:    row.get(0)?,
      user_id:      row.get(1)?,
      enrolled_at:  row.get(2)?,
      completed_at: row.get(3)?,
    })
  }

  pub fn into_enrollment(self) -> Result<CourseEnrollment> {
    Ok(CourseEnrollment {
      course_id:    decode_uuid(&self.course_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      enrolled_at:  decode_dt(&self.enrolled_at)?,
      completed_at: decode_opt_dt(self.completed_at)?,
    })
  }
}

pub struct RawCommunity {
  pub community_id: String,
  pub name:         String,
  pub owner_id:     String,
  pub created_at:   String,
}

impl RawCommunity {
  pub fn into_community(self) -> Result<Community> {
    Ok(Community {
      community_id: decode_uuid(&self.community_id)?,
      name:         self.name,
      owner_id:     decode_uuid(&self.owner_id)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawMembership {
  pub community_id: String,
  pub user_id:      String,
  pub joined_at:    String,
}

impl RawMembership {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      community_id: row.get(0)?,
      user_id:      row.get(1)?,
      joined_at:    row.get(2)?,
    })
  }

  pub fn into_membership(self) -> Result<Membership> {
    Ok(Membership {
      community_id: decode_uuid(&self.community_id)?,
      user_id:      decode_uuid(&self.user_id)?,
      joined_at:    decode_dt(&self.joined_at)?,
    })
  }
}

pub const EVENT_COLUMNS: &str = "event_id, title, starts_at, ends_at, max_attendees, \
                                 requires_registration, registration_deadline_hours, \
                                 allow_waitlist, creator_id, created_at";

pub struct RawEvent {
  pub event_id:                    String,
  pub title:                       String,
  pub starts_at:                   String,
  pub ends_at:                     String,
  pub max_attendees:               Option<u32>,
  pub requires_registration:       bool,
  pub registration_deadline_hours: u32,
  pub allow_waitlist:              bool,
  pub creator_id:                  String,
  pub created_at:                  String,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:                    row.get(0)?,
      title:                       row.get(1)?,
      starts_at:                   row.get(2)?,
      ends_at:                     row.get(3)?,
      max_attendees:               row.get(4)?,
      requires_registration:       row.get(5)?,
      registration_deadline_hours: row.get(6)?,
      allow_waitlist:              row.get(7)?,
      creator_id:                  row.get(8)?,
      created_at:                  row.get(9)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:                    decode_uuid(&self.event_id)?,
      title:                       self.title,
      starts_at:                   decode_dt(&self.starts_at)?,
      ends_at:                     decode_dt(&self.ends_at)?,
      max_attendees:               self.max_attendees,
      requires_registration:       self.requires_registration,
      registration_deadline_hours: self.registration_deadline_hours,
      allow_waitlist:              self.allow_waitlist,
      creator_id:                  decode_uuid(&self.creator_id)?,
      created_at:                  decode_dt(&self.created_at)?,
    })
  }
}

pub const REGISTRATION_COLUMNS: &str = "event_id, user_id, status, created_at";

pub struct RawRegistration {
  pub event_id:   String,
  pub user_id:    String,
  pub status:     String,
  pub created_at: String,
}

impl RawRegistration {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:   row.get(0)?,
      user_id:    row.get(1)?,
      status:     row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_registration(self) -> Result<Registration> {
    Ok(Registration {
      event_id:   decode_uuid(&self.event_id)?,
      user_id:    decode_uuid(&self.user_id)?,
      status:     parse_variant::<RegistrationStatus>("registration status", &self.status)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str =
  "notification_id, user_id, kind, title, body, created_at, read_at";

pub struct RawNotification {
  pub notification_id: String,
  pub user_id:         String,
  pub kind:            String,
  pub title:           String,
  pub body:            String,
  pub created_at:      String,
  pub read_at:         Option<String>,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      user_id:         row.get(1)?,
      kind:            row.get(2)?,
      title:           row.get(3)?,
      body:            row.get(4)?,
      created_at:      row.get(5)?,
      read_at:         row.get(6)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      kind:            parse_variant::<NotificationKind>("notification kind", &self.kind)?,
      title:           self.title,
      body:            self.body,
      created_at:      decode_dt(&self.created_at)?,
      read_at:         decode_opt_dt(self.read_at)?,
    })
  }
}
