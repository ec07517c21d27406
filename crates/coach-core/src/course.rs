//! Courses, lessons, enrollments and lesson progress.
//!
//! A course's [`AccessType`] decides who may enroll; see
//! [`crate::access`] for the rules. Enrollment completion is derived from
//! lesson progress: an enrollment is complete once every published lesson
//! of its course has a progress record for the enrolled user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::{Decision, Rejection};

// ─── Access type ─────────────────────────────────────────────────────────────

/// How enrollment eligibility for a course is decided.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
  /// Anyone may enroll.
  #[default]
  Open,
  /// The prerequisite course must be completed first.
  Sequential,
  /// Only members of the linked community may enroll.
  Community,
  /// Enrollments are provisioned by staff; nobody may self-enroll.
  Private,
}

// ─── Course ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
  pub course_id:       Uuid,
  pub title:           String,
  pub description:     Option<String>,
  pub access_type:     AccessType,
  /// Consulted only when `access_type` is [`AccessType::Sequential`].
  pub prerequisite_id: Option<Uuid>,
  /// Consulted only when `access_type` is [`AccessType::Community`].
  pub community_id:    Option<Uuid>,
  pub creator_id:      Uuid,
  pub is_published:    bool,
  pub is_archived:     bool,
  pub created_at:      DateTime<Utc>,
}

impl Course {
  /// Whether clients can currently enroll, independent of access rules.
  pub fn is_enrollable(&self) -> bool { self.is_published && !self.is_archived }
}

/// Input for creating a course. The creator is the acting user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCourse {
  pub title:           String,
  pub description:     Option<String>,
  #[serde(default)]
  pub access_type:     AccessType,
  pub prerequisite_id: Option<Uuid>,
  pub community_id:    Option<Uuid>,
  #[serde(default)]
  pub is_published:    bool,
}

impl NewCourse {
  pub fn validate(&self) -> Decision<()> {
    if self.title.trim().is_empty() {
      return Err(Rejection::Invalid("title must not be empty".into()));
    }
    Ok(())
  }
}

/// A partial update. `None` leaves a field untouched; for the nullable
/// references, `Some(None)` clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseUpdate {
  pub title:           Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub description:     Option<Option<String>>,
  pub access_type:     Option<AccessType>,
  #[serde(default, deserialize_with = "nullable")]
  pub prerequisite_id: Option<Option<Uuid>>,
  #[serde(default, deserialize_with = "nullable")]
  pub community_id:    Option<Option<Uuid>>,
  pub is_published:    Option<bool>,
  pub is_archived:     Option<bool>,
}

impl CourseUpdate {
  pub fn validate(&self, course_id: Uuid) -> Decision<()> {
    if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
      return Err(Rejection::Invalid("title must not be empty".into()));
    }
    if self.prerequisite_id == Some(Some(course_id)) {
      return Err(Rejection::Invalid("a course cannot be its own prerequisite".into()));
    }
    Ok(())
  }

  pub fn apply(self, course: &mut Course) {
    if let Some(title) = self.title {
      course.title = title;
    }
    if let Some(description) = self.description {
      course.description = description;
    }
    if let Some(access_type) = self.access_type {
      course.access_type = access_type;
    }
    if let Some(prerequisite_id) = self.prerequisite_id {
      course.prerequisite_id = prerequisite_id;
    }
    if let Some(community_id) = self.community_id {
      course.community_id = community_id;
    }
    if let Some(is_published) = self.is_published {
      course.is_published = is_published;
    }
    if let Some(is_archived) = self.is_archived {
      course.is_archived = is_archived;
    }
  }
}

/// Distinguishes an absent field from an explicit `null`.
fn nullable<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

// ─── Lessons ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
  pub lesson_id:    Uuid,
  pub course_id:    Uuid,
  pub title:        String,
  pub position:     u32,
  /// Unpublished lessons do not count toward completion.
  pub is_published: bool,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLesson {
  pub title:        String,
  #[serde(default)]
  pub position:     u32,
  #[serde(default = "default_true")]
  pub is_published: bool,
}

fn default_true() -> bool { true }

// ─── Enrollment ──────────────────────────────────────────────────────────────

/// At most one per `(course_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEnrollment {
  pub course_id:    Uuid,
  pub user_id:      Uuid,
  pub enrolled_at:  DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}

impl CourseEnrollment {
  pub fn is_completed(&self) -> bool { self.completed_at.is_some() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
  pub lesson_id:    Uuid,
  pub user_id:      Uuid,
  pub completed_at: DateTime<Utc>,
}

/// Returned by [`crate::store::CoachStore::enroll`]; `created` is false when
/// the enrollment already existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrolled {
  pub enrollment: CourseEnrollment,
  pub created:    bool,
}
