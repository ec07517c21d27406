//! Handlers for `/events` endpoints.
//!
//! | Method   | Path                        | Notes |
//! |----------|-----------------------------|-------|
//! | `GET`    | `/events`                   | Upcoming by default; `?include_past=true`, `?creator=<uuid>`, `?limit=<n>` |
//! | `POST`   | `/events`                   | Instructors only |
//! | `GET`    | `/events/:id`               | |
//! | `PATCH`  | `/events/:id`               | Owner or admin; capacity changes never move anyone |
//! | `DELETE` | `/events/:id`               | Owner or admin |
//! | `GET`    | `/events/:id/registrations` | Owner or admin |
//! | `POST`   | `/events/:id/registrations` | Registers the caller; 201 with the status |
//! | `DELETE` | `/events/:id/registrations` | Cancels the caller; reports any promotion |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use coach_core::{
  Rejection,
  event::{Cancellation, Event, EventUpdate, NewEvent, Registration},
  store::{CoachStore, EventQuery},
  workflow,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::{ApiError, settle},
  identity::Identity,
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub include_past: bool,
  pub creator:      Option<Uuid>,
  pub limit:        Option<usize>,
}

/// `GET /events`
pub async fn list<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(_actor): Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let query = EventQuery {
    ends_after: (!params.include_past).then(Utc::now),
    creator_id: params.creator,
    limit:      params.limit,
  };
  let events = store.list_events(query).await.map_err(ApiError::store)?;
  Ok(Json(events))
}

// ─── CRUD ─────────────────────────────────────────────────────────────────────

/// `POST /events`
pub async fn create<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
  let event = settle(workflow::create_event(store.as_ref(), actor, body).await)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /events/:id`
pub async fn get_one<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(_actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
  let event = store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| Rejection::not_found("event"))?;
  Ok(Json(event))
}

/// `PATCH /events/:id`
pub async fn update<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<EventUpdate>,
) -> Result<Json<Event>, ApiError> {
  Ok(Json(settle(workflow::update_event(store.as_ref(), actor, id, body).await)?))
}

/// `DELETE /events/:id`
pub async fn delete<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  settle(workflow::delete_event(store.as_ref(), actor, id).await)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Registrations ────────────────────────────────────────────────────────────

/// `GET /events/:id/registrations`
pub async fn registrations<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Registration>>, ApiError> {
  Ok(Json(settle(workflow::list_registrations(store.as_ref(), actor, id).await)?))
}

/// `POST /events/:id/registrations`
pub async fn register<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let registration = settle(workflow::register(store.as_ref(), actor, id, Utc::now()).await)?;
  Ok((StatusCode::CREATED, Json(registration)))
}

/// `DELETE /events/:id/registrations`
pub async fn cancel<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Cancellation>, ApiError> {
  Ok(Json(settle(workflow::cancel(store.as_ref(), actor, id, Utc::now()).await)?))
}
