//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use coach_core::{Decision, Rejection};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The identity headers were missing or malformed.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  #[error(transparent)]
  Rejected(#[from] Rejection),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    ApiError::Store(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      ApiError::Rejected(rejection) => match rejection {
        Rejection::NotFound(_) => StatusCode::NOT_FOUND,
        Rejection::Unauthorized(_) | Rejection::PolicyDenied(_) => StatusCode::FORBIDDEN,
        Rejection::DeadlinePassed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Rejection::CapacityExceeded | Rejection::Conflict(_) => StatusCode::CONFLICT,
        Rejection::Invalid(_) => StatusCode::BAD_REQUEST,
      },
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if let ApiError::Store(e) = &self {
      tracing::error!(error = %e, "store failure");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

/// Flatten a workflow outcome into a handler result.
pub fn settle<T, E>(outcome: Result<Decision<T>, E>) -> Result<T, ApiError>
where
  E: std::error::Error + Send + Sync + 'static,
{
  Ok(outcome.map_err(ApiError::store)??)
}
