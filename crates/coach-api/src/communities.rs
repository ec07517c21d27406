//! Handlers for `/communities` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use coach_core::{store::CoachStore, workflow};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::{ApiError, settle},
  identity::Identity,
};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /communities` with body `{"name":"..."}`
pub async fn create<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let community = settle(workflow::create_community(store.as_ref(), actor, body.name).await)?;
  Ok((StatusCode::CREATED, Json(community)))
}

/// Without a `user_id` the caller joins.
#[derive(Debug, Default, Deserialize)]
pub struct MemberBody {
  pub user_id: Option<Uuid>,
}

/// `POST /communities/:id/members`
pub async fn add_member<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<MemberBody>,
) -> Result<impl IntoResponse, ApiError> {
  let user_id = body.user_id.unwrap_or(actor.user_id);
  let membership =
    settle(workflow::add_member(store.as_ref(), actor, id, user_id, Utc::now()).await)?;
  Ok((StatusCode::CREATED, Json(membership)))
}
