//! Course access evaluation.
//!
//! | Access type | Allowed when |
//! |-------------|--------------|
//! | `OPEN`       | always |
//! | `SEQUENTIAL` | no prerequisite, or the prerequisite enrollment is completed |
//! | `COMMUNITY`  | no linked community, or the user is a member of it |
//! | `PRIVATE`    | the user already holds an enrollment for this course |
//!
//! [`evaluate`] holds the rules over pre-fetched [`AccessFacts`];
//! [`can_access`] fetches exactly the facts the course's access type needs.
//! Neither ever writes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  course::{AccessType, Course},
  store::CoachStore,
};

pub const PREREQUISITE_REQUIRED: &str = "must complete prerequisite first";
pub const COMMUNITY_REQUIRED: &str = "must be a member of the linked community";
pub const NO_ACCESS: &str = "no access to this course";

/// The answer to "may this user enroll in / view this course?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
  pub allowed: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub reason:  Option<String>,
}

impl AccessDecision {
  pub fn allow() -> Self { Self { allowed: true, reason: None } }

  pub fn deny(reason: impl Into<String>) -> Self {
    Self { allowed: false, reason: Some(reason.into()) }
  }
}

/// What is known about a user's relationship to a course's gatekeepers.
///
/// A missing record is simply `false`; it is not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFacts {
  /// The user's enrollment in the prerequisite course has `completed_at`.
  pub prerequisite_completed: bool,
  /// The user is a member of the course's community.
  pub community_member:       bool,
  /// The user already has an enrollment for this very course.
  pub enrolled:               bool,
}

pub fn evaluate(course: &Course, facts: &AccessFacts) -> AccessDecision {
  match course.access_type {
    AccessType::Open => AccessDecision::allow(),
    AccessType::Sequential => {
      if course.prerequisite_id.is_none() || facts.prerequisite_completed {
        AccessDecision::allow()
      } else {
        AccessDecision::deny(PREREQUISITE_REQUIRED)
      }
    }
    AccessType::Community => {
      if course.community_id.is_none() || facts.community_member {
        AccessDecision::allow()
      } else {
        AccessDecision::deny(COMMUNITY_REQUIRED)
      }
    }
    AccessType::Private => {
      if facts.enrolled {
        AccessDecision::allow()
      } else {
        AccessDecision::deny(NO_ACCESS)
      }
    }
  }
}

/// Decide whether `user_id` may access `course`, consulting `store` only
/// for the facts the course's access type depends on.
pub async fn can_access<S: CoachStore>(
  store: &S,
  user_id: Uuid,
  course: &Course,
) -> Result<AccessDecision, S::Error> {
  let mut facts = AccessFacts::default();

  match course.access_type {
    AccessType::Open => {}
    AccessType::Sequential => {
      if let Some(prerequisite_id) = course.prerequisite_id {
        facts.prerequisite_completed = store
          .get_enrollment(prerequisite_id, user_id)
          .await?
          .is_some_and(|e| e.is_completed());
      }
    }
    AccessType::Community => {
      if let Some(community_id) = course.community_id {
        facts.community_member = store.is_member(community_id, user_id).await?;
      }
    }
    AccessType::Private => {
      facts.enrolled = store
        .get_enrollment(course.course_id, user_id)
        .await?
        .is_some();
    }
  }

  Ok(evaluate(course, &facts))
}
