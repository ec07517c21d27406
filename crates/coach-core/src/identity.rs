//! The acting user, as resolved by the session layer.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::error::{Decision, Rejection};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  Client,
  Instructor,
  SuperAdmin,
}

/// Who is performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn new(user_id: Uuid, role: Role) -> Self { Self { user_id, role } }

  pub fn is_admin(&self) -> bool { self.role == Role::SuperAdmin }

  /// Instructors and super admins may author courses and events.
  pub fn require_staff(&self) -> Decision<()> {
    match self.role {
      Role::Instructor | Role::SuperAdmin => Ok(()),
      Role::Client => Err(Rejection::unauthorized("only instructors can do this")),
    }
  }

  /// The owner of a record, or a super admin, may mutate it.
  pub fn require_owner(&self, owner_id: Uuid) -> Decision<()> {
    if self.is_admin() || self.user_id == owner_id {
      Ok(())
    } else {
      Err(Rejection::unauthorized("only the creator or an admin can do this"))
    }
  }
}
