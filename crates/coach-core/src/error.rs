//! Error types for `coach-core`.
//!
//! Two families live here. [`Rejection`] is the set of expected, structured
//! outcomes a caller can act on (deny, conflict, full, …); it is returned as
//! data inside a [`Decision`]. [`Error`] covers values that cannot be
//! represented by the domain types at all and is fatal to the request.

use thiserror::Error;

/// Why the platform refused an operation.
///
/// Rejections are never retried by the core; they are surfaced to the
/// caller with their message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
  #[error("{0} not found")]
  NotFound(String),

  #[error("not permitted: {0}")]
  Unauthorized(String),

  #[error("{0}")]
  PolicyDenied(String),

  #[error("{}", deadline_message(.action, .hours))]
  DeadlinePassed { action: DeadlineAction, hours: u32 },

  #[error("event full")]
  CapacityExceeded,

  #[error("{0}")]
  Conflict(String),

  #[error("invalid request: {0}")]
  Invalid(String),
}

/// Which time window a [`Rejection::DeadlinePassed`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineAction {
  Registration,
  Cancellation,
}

fn deadline_message(action: &DeadlineAction, hours: &u32) -> String {
  match action {
    DeadlineAction::Registration => {
      format!("registration deadline passed (closes {hours} hours before start)")
    }
    DeadlineAction::Cancellation => {
      format!("cancellation is only possible up to {hours} hours before the event")
    }
  }
}

impl Rejection {
  pub fn not_found(what: impl Into<String>) -> Self { Self::NotFound(what.into()) }

  pub fn unauthorized(what: impl Into<String>) -> Self {
    Self::Unauthorized(what.into())
  }

  pub fn denied(reason: impl Into<String>) -> Self { Self::PolicyDenied(reason.into()) }
}

/// The outcome of a policy-bearing operation: the value, or a [`Rejection`].
pub type Decision<T> = std::result::Result<T, Rejection>;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored discriminant that does not name any variant, e.g. an access
  /// type written by a newer schema.
  #[error("unknown {kind}: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse a stored discriminant into one of the core enums.
pub fn parse_variant<T: std::str::FromStr>(kind: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::UnknownVariant {
    kind,
    value: value.to_owned(),
  })
}
