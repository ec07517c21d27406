//! Handlers for `/notifications`. Callers only ever see their own.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use coach_core::{Rejection, notification::Notification, store::CoachStore};
use uuid::Uuid;

use crate::{error::ApiError, identity::Identity};

/// `GET /notifications`
pub async fn list<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
) -> Result<Json<Vec<Notification>>, ApiError> {
  let notifications = store
    .list_notifications(actor.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notifications))
}

/// `POST /notifications/:id/read`
pub async fn mark_read<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
  let notification = store
    .mark_notification_read(id, actor.user_id, Utc::now())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Rejection::not_found("notification"))?;
  Ok(Json(notification))
}
