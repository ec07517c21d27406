//! Handlers for `/courses` and `/lessons` endpoints.
//!
//! | Method   | Path                        | Notes |
//! |----------|-----------------------------|-------|
//! | `GET`    | `/courses`                  | Published courses plus the caller's own |
//! | `POST`   | `/courses`                  | Instructors only |
//! | `GET`    | `/courses/:id`              | 404 for unpublished courses of others |
//! | `PATCH`  | `/courses/:id`              | Owner or admin; `null` clears a field |
//! | `DELETE` | `/courses/:id`              | Owner or admin |
//! | `GET`    | `/courses/:id/lessons`      | |
//! | `POST`   | `/courses/:id/lessons`      | Owner or admin |
//! | `GET`    | `/courses/:id/access`       | `{"allowed":false,"reason":"..."}` |
//! | `POST`   | `/courses/:id/enrollment`   | Idempotent |
//! | `DELETE` | `/courses/:id/enrollment`   | |
//! | `POST`   | `/lessons/:id/complete`     | Returns the enrollment |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use coach_core::{
  access::AccessDecision,
  course::{Course, CourseEnrollment, CourseUpdate, Lesson, NewCourse, NewLesson},
  store::CoachStore,
  workflow,
};
use uuid::Uuid;

use crate::{
  error::{ApiError, settle},
  identity::Identity,
};

// ─── Courses ──────────────────────────────────────────────────────────────────

/// `GET /courses`
pub async fn list<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
) -> Result<Json<Vec<Course>>, ApiError> {
  let courses = workflow::list_courses(store.as_ref(), actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(courses))
}

/// `POST /courses`
pub async fn create<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Json(body): Json<NewCourse>,
) -> Result<impl IntoResponse, ApiError> {
  let course = settle(workflow::create_course(store.as_ref(), actor, body).await)?;
  Ok((StatusCode::CREATED, Json(course)))
}

/// `GET /courses/:id`
pub async fn get_one<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Course>, ApiError> {
  Ok(Json(settle(workflow::get_course(store.as_ref(), actor, id).await)?))
}

/// `PATCH /courses/:id`
pub async fn update<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<CourseUpdate>,
) -> Result<Json<Course>, ApiError> {
  Ok(Json(settle(workflow::update_course(store.as_ref(), actor, id, body).await)?))
}

/// `DELETE /courses/:id`
pub async fn delete<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  settle(workflow::delete_course(store.as_ref(), actor, id).await)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Lessons ──────────────────────────────────────────────────────────────────

/// `GET /courses/:id/lessons`
pub async fn lessons<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
  Ok(Json(settle(workflow::list_lessons(store.as_ref(), actor, id).await)?))
}

/// `POST /courses/:id/lessons`
pub async fn add_lesson<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<NewLesson>,
) -> Result<impl IntoResponse, ApiError> {
  let lesson = settle(workflow::add_lesson(store.as_ref(), actor, id, body).await)?;
  Ok((StatusCode::CREATED, Json(lesson)))
}

/// `POST /lessons/:id/complete`
pub async fn complete_lesson<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<CourseEnrollment>, ApiError> {
  let enrollment = workflow::complete_lesson(store.as_ref(), actor, id, Utc::now()).await;
  Ok(Json(settle(enrollment)?))
}

// ─── Access and enrollment ────────────────────────────────────────────────────

/// `GET /courses/:id/access`
pub async fn access<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<AccessDecision>, ApiError> {
  Ok(Json(settle(workflow::check_access(store.as_ref(), actor, id).await)?))
}

/// `POST /courses/:id/enrollment`
pub async fn enroll<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<CourseEnrollment>, ApiError> {
  Ok(Json(settle(workflow::enroll(store.as_ref(), actor, id, Utc::now()).await)?))
}

/// `DELETE /courses/:id/enrollment`
pub async fn unenroll<S: CoachStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  settle(workflow::unenroll(store.as_ref(), actor, id).await)?;
  Ok(StatusCode::NO_CONTENT)
}
