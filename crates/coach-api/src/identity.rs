//! Request identity extractor.
//!
//! Authentication happens upstream. The session layer forwards the resolved
//! user as two headers, which this extractor turns into an [`Actor`].

use axum::{extract::FromRequestParts, http::request::Parts};
use coach_core::identity::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller. Present in a handler means both identity
/// headers were present and well-formed.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub Actor);

impl<St> FromRequestParts<St> for Identity
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    let header = |name: &str| {
      parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))
    };

    let user_id = Uuid::parse_str(header(USER_ID_HEADER)?)
      .map_err(|_| ApiError::Unauthenticated(format!("malformed {USER_ID_HEADER} header")))?;
    let role = header(ROLE_HEADER)?
      .parse::<Role>()
      .map_err(|_| ApiError::Unauthenticated(format!("unknown role in {ROLE_HEADER} header")))?;

    Ok(Identity(Actor::new(user_id, role)))
  }
}
