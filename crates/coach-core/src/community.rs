//! Communities: groups of clients around an instructor.
//!
//! Membership gates courses with [`crate::course::AccessType::Community`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
  pub community_id: Uuid,
  pub name:         String,
  pub owner_id:     Uuid,
  pub created_at:   DateTime<Utc>,
}

/// At most one per `(community_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
  pub community_id: Uuid,
  pub user_id:      Uuid,
  pub joined_at:    DateTime<Utc>,
}
