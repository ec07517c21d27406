//! JSON REST API for the coaching platform.
//!
//! Exposes an axum [`Router`] backed by any [`coach_core::store::CoachStore`].
//! Authentication, TLS, and transport concerns are the caller's
//! responsibility; identity arrives in the `x-user-id` and `x-user-role`
//! headers (see [`identity`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", coach_api::api_router(store.clone()))
//! ```

pub mod communities;
pub mod courses;
pub mod error;
pub mod events;
pub mod identity;
pub mod notifications;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use coach_core::store::CoachStore;

pub use error::ApiError;
pub use identity::Identity;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: CoachStore + 'static,
{
  Router::new()
    // Courses
    .route("/courses", get(courses::list::<S>).post(courses::create::<S>))
    .route(
      "/courses/{id}",
      get(courses::get_one::<S>)
        .patch(courses::update::<S>)
        .delete(courses::delete::<S>),
    )
    .route(
      "/courses/{id}/lessons",
      get(courses::lessons::<S>).post(courses::add_lesson::<S>),
    )
    .route("/courses/{id}/access", get(courses::access::<S>))
    .route(
      "/courses/{id}/enrollment",
      post(courses::enroll::<S>).delete(courses::unenroll::<S>),
    )
    .route("/lessons/{id}/complete", post(courses::complete_lesson::<S>))
    // Communities
    .route("/communities", post(communities::create::<S>))
    .route("/communities/{id}/members", post(communities::add_member::<S>))
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/{id}",
      get(events::get_one::<S>)
        .patch(events::update::<S>)
        .delete(events::delete::<S>),
    )
    .route(
      "/events/{id}/registrations",
      get(events::registrations::<S>)
        .post(events::register::<S>)
        .delete(events::cancel::<S>),
    )
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
  };
  use chrono::{Duration, Utc};
  use coach_core::access::PREREQUISITE_REQUIRED;
  use coach_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store))
  }

  struct Caller {
    user_id: Uuid,
    role:    &'static str,
  }

  impl Caller {
    fn instructor() -> Self { Self { user_id: Uuid::new_v4(), role: "INSTRUCTOR" } }

    fn client() -> Self { Self { user_id: Uuid::new_v4(), role: "CLIENT" } }
  }

  async fn send(
    app: &Router,
    caller: Option<&Caller>,
    method: Method,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
      req = req
        .header(identity::USER_ID_HEADER, caller.user_id.to_string())
        .header(identity::ROLE_HEADER, caller.role);
    }
    let req = match body {
      Some(body) => req
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap(),
      None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn create_event(app: &Router, owner: &Caller, max: u32, waitlist: bool) -> String {
    let starts = Utc::now() + Duration::days(3);
    let (status, body) = send(
      app,
      Some(owner),
      Method::POST,
      "/events",
      Some(json!({
        "title": "Sunrise yoga",
        "starts_at": starts,
        "ends_at": starts + Duration::hours(1),
        "max_attendees": max,
        "registration_deadline_hours": 2,
        "allow_waitlist": waitlist,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["event_id"].as_str().unwrap().to_owned()
  }

  #[tokio::test]
  async fn missing_identity_is_unauthenticated() {
    let app = app().await;
    let (status, body) = send(&app, None, Method::GET, "/courses", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));

    let bogus = Request::builder()
      .uri("/courses")
      .header(identity::USER_ID_HEADER, Uuid::new_v4().to_string())
      .header(identity::ROLE_HEADER, "COACH")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(bogus).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn clients_cannot_create_courses() {
    let app = app().await;
    let (status, _) = send(
      &app,
      Some(&Caller::client()),
      Method::POST,
      "/courses",
      Some(json!({ "title": "Mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn enroll_in_open_course() {
    let app = app().await;
    let coach = Caller::instructor();
    let user = Caller::client();

    let (status, course) = send(
      &app,
      Some(&coach),
      Method::POST,
      "/courses",
      Some(json!({ "title": "Mobility", "is_published": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["access_type"], "OPEN");
    let id = course["course_id"].as_str().unwrap();

    let (status, access) =
      send(&app, Some(&user), Method::GET, &format!("/courses/{id}/access"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(access, json!({ "allowed": true }));

    let (status, enrollment) =
      send(&app, Some(&user), Method::POST, &format!("/courses/{id}/enrollment"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(enrollment["user_id"], user.user_id.to_string());

    let (status, notes) = send(&app, Some(&user), Method::GET, "/notifications", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes[0]["kind"], "COURSE_ENROLLED");
  }

  #[tokio::test]
  async fn draft_course_enrollment_is_not_found() {
    let app = app().await;
    let coach = Caller::instructor();

    let (status, course) = send(
      &app,
      Some(&coach),
      Method::POST,
      "/courses",
      Some(json!({ "title": "Unreleased" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let path = format!("/courses/{}/enrollment", course["course_id"].as_str().unwrap());

    for caller in [Caller::client(), Caller::instructor()] {
      let (status, _) = send(&app, Some(&caller), Method::POST, &path, None).await;
      assert_eq!(status, StatusCode::NOT_FOUND);
    }
    let (status, _) = send(&app, Some(&coach), Method::POST, &path, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn sequential_course_denial_reports_reason() {
    let app = app().await;
    let coach = Caller::instructor();
    let user = Caller::client();

    let (_, first) = send(
      &app,
      Some(&coach),
      Method::POST,
      "/courses",
      Some(json!({ "title": "Level 1", "is_published": true })),
    )
    .await;
    let (status, second) = send(
      &app,
      Some(&coach),
      Method::POST,
      "/courses",
      Some(json!({
        "title": "Level 2",
        "access_type": "SEQUENTIAL",
        "prerequisite_id": first["course_id"],
        "is_published": true,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{second}");
    let id = second["course_id"].as_str().unwrap();

    let (status, access) =
      send(&app, Some(&user), Method::GET, &format!("/courses/{id}/access"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(access, json!({ "allowed": false, "reason": PREREQUISITE_REQUIRED }));

    let (status, body) =
      send(&app, Some(&user), Method::POST, &format!("/courses/{id}/enrollment"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], PREREQUISITE_REQUIRED);
  }

  #[tokio::test]
  async fn unpublished_course_is_hidden_from_clients() {
    let app = app().await;
    let coach = Caller::instructor();
    let (_, draft) = send(
      &app,
      Some(&coach),
      Method::POST,
      "/courses",
      Some(json!({ "title": "Draft" })),
    )
    .await;
    let uri = format!("/courses/{}", draft["course_id"].as_str().unwrap());

    let (status, _) = send(&app, Some(&Caller::client()), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Some(&coach), Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn patch_with_null_clears_capacity() {
    let app = app().await;
    let coach = Caller::instructor();
    let id = create_event(&app, &coach, 1, false).await;

    let (status, event) = send(
      &app,
      Some(&coach),
      Method::PATCH,
      &format!("/events/{id}"),
      Some(json!({ "max_attendees": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["max_attendees"], Value::Null);

    let (status, _) = send(
      &app,
      Some(&Caller::instructor()),
      Method::PATCH,
      &format!("/events/{id}"),
      Some(json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn registration_flow_over_http() {
    let app = app().await;
    let coach = Caller::instructor();
    let (a, b, c) = (Caller::client(), Caller::client(), Caller::client());
    let id = create_event(&app, &coach, 1, true).await;
    let regs = format!("/events/{id}/registrations");

    let (status, reg) = send(&app, Some(&a), Method::POST, &regs, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reg["status"], "REGISTERED");

    let (status, reg) = send(&app, Some(&b), Method::POST, &regs, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reg["status"], "WAITLIST");

    let (status, body) = send(&app, Some(&a), Method::POST, &regs, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already registered");

    let (status, _) = send(&app, Some(&a), Method::GET, &regs, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, cancellation) = send(&app, Some(&a), Method::DELETE, &regs, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancellation["promoted"]["user_id"], b.user_id.to_string());
    assert_eq!(cancellation["promoted"]["status"], "REGISTERED");

    let (status, _) = send(&app, Some(&c), Method::DELETE, &regs, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = send(&app, Some(&coach), Method::GET, &regs, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn full_event_without_waitlist_is_a_conflict() {
    let app = app().await;
    let coach = Caller::instructor();
    let id = create_event(&app, &coach, 1, false).await;
    let regs = format!("/events/{id}/registrations");

    send(&app, Some(&Caller::client()), Method::POST, &regs, None).await;
    let (status, body) = send(&app, Some(&Caller::client()), Method::POST, &regs, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "event full");
  }

  #[tokio::test]
  async fn oversized_deadline_is_rejected() {
    let app = app().await;
    let starts = Utc::now() + Duration::days(3);
    let (status, body) = send(
      &app,
      Some(&Caller::instructor()),
      Method::POST,
      "/events",
      Some(json!({
        "title": "Someday",
        "starts_at": starts,
        "ends_at": starts + Duration::hours(1),
        "registration_deadline_hours": u32::MAX,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("registration_deadline_hours"));
  }

  #[tokio::test]
  async fn registration_after_deadline_is_unprocessable() {
    let app = app().await;
    let coach = Caller::instructor();
    let starts = Utc::now() + Duration::hours(1);
    let (_, event) = send(
      &app,
      Some(&coach),
      Method::POST,
      "/events",
      Some(json!({
        "title": "Last minute",
        "starts_at": starts,
        "ends_at": starts + Duration::hours(1),
        "registration_deadline_hours": 2,
      })),
    )
    .await;
    let uri = format!("/events/{}/registrations", event["event_id"].as_str().unwrap());

    let (status, body) = send(&app, Some(&Caller::client()), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("2 hours"));
  }

  #[tokio::test]
  async fn notifications_are_scoped_to_the_caller() {
    let app = app().await;
    let coach = Caller::instructor();
    let user = Caller::client();
    let id = create_event(&app, &coach, 5, false).await;
    send(&app, Some(&user), Method::POST, &format!("/events/{id}/registrations"), None).await;

    let (_, notes) = send(&app, Some(&user), Method::GET, "/notifications", None).await;
    let note_id = notes[0]["notification_id"].as_str().unwrap().to_owned();
    assert_eq!(notes[0]["kind"], "REGISTRATION_CONFIRMED");

    let uri = format!("/notifications/{note_id}/read");
    let (status, _) = send(&app, Some(&Caller::client()), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, note) = send(&app, Some(&user), Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(note["read_at"].is_string());
  }
}
