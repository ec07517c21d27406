//! Async HTTP client wrapping the coaching platform JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use coach_core::{
  access::AccessDecision,
  community::Membership,
  course::{Course, CourseEnrollment, Lesson, NewCourse},
  event::{Cancellation, Event, NewEvent, Registration},
  notification::Notification,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

/// Connection settings for the API, including the identity forwarded in
/// the `x-user-id` and `x-user-role` headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
  pub base_url: String,
  pub user_id:  Uuid,
  pub role:     String,
}

/// Async HTTP client for the JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn identity(&self, req: RequestBuilder) -> RequestBuilder {
    req
      .header("x-user-id", self.config.user_id.to_string())
      .header("x-user-role", &self.config.role)
  }

  async fn send(&self, req: RequestBuilder, what: &str) -> Result<Response> {
    let resp = self
      .identity(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(anyhow!("{what} → {status}: {}", error_message(&body)))
  }

  async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> Result<T> {
    self
      .send(req, what)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising response to {what}"))
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  /// `GET /api/courses`
  pub async fn list_courses(&self) -> Result<Vec<Course>> {
    self.fetch(self.client.get(self.url("/courses")), "GET /courses").await
  }

  /// `POST /api/courses`
  pub async fn create_course(&self, input: &NewCourse) -> Result<Course> {
    let req = self.client.post(self.url("/courses")).json(input);
    self.fetch(req, "POST /courses").await
  }

  /// `GET /api/courses/:id/lessons`
  pub async fn list_lessons(&self, course_id: Uuid) -> Result<Vec<Lesson>> {
    let req = self.client.get(self.url(&format!("/courses/{course_id}/lessons")));
    self.fetch(req, "GET /courses/:id/lessons").await
  }

  /// `GET /api/courses/:id/access`
  pub async fn check_access(&self, course_id: Uuid) -> Result<AccessDecision> {
    let req = self.client.get(self.url(&format!("/courses/{course_id}/access")));
    self.fetch(req, "GET /courses/:id/access").await
  }

  /// `POST /api/courses/:id/enrollment`
  pub async fn enroll(&self, course_id: Uuid) -> Result<CourseEnrollment> {
    let req = self.client.post(self.url(&format!("/courses/{course_id}/enrollment")));
    self.fetch(req, "POST /courses/:id/enrollment").await
  }

  /// `DELETE /api/courses/:id/enrollment`
  pub async fn unenroll(&self, course_id: Uuid) -> Result<()> {
    let req = self.client.delete(self.url(&format!("/courses/{course_id}/enrollment")));
    self.send(req, "DELETE /courses/:id/enrollment").await?;
    Ok(())
  }

  /// `POST /api/lessons/:id/complete`
  pub async fn complete_lesson(&self, lesson_id: Uuid) -> Result<CourseEnrollment> {
    let req = self.client.post(self.url(&format!("/lessons/{lesson_id}/complete")));
    self.fetch(req, "POST /lessons/:id/complete").await
  }

  // ── Communities ───────────────────────────────────────────────────────────

  /// `POST /api/communities/:id/members`, joining as the configured user.
  pub async fn join_community(&self, community_id: Uuid) -> Result<Membership> {
    let req = self
      .client
      .post(self.url(&format!("/communities/{community_id}/members")))
      .json(&json!({}));
    self.fetch(req, "POST /communities/:id/members").await
  }

  // ── Events ────────────────────────────────────────────────────────────────

  /// `GET /api/events[?include_past=true]`
  pub async fn list_events(&self, include_past: bool) -> Result<Vec<Event>> {
    let req = self
      .client
      .get(self.url("/events"))
      .query(&[("include_past", include_past)]);
    self.fetch(req, "GET /events").await
  }

  /// `POST /api/events`
  pub async fn create_event(&self, input: &NewEvent) -> Result<Event> {
    let req = self.client.post(self.url("/events")).json(input);
    self.fetch(req, "POST /events").await
  }

  /// `GET /api/events/:id/registrations`
  pub async fn list_registrations(&self, event_id: Uuid) -> Result<Vec<Registration>> {
    let req = self.client.get(self.url(&format!("/events/{event_id}/registrations")));
    self.fetch(req, "GET /events/:id/registrations").await
  }

  /// `POST /api/events/:id/registrations`
  pub async fn register(&self, event_id: Uuid) -> Result<Registration> {
    let req = self.client.post(self.url(&format!("/events/{event_id}/registrations")));
    self.fetch(req, "POST /events/:id/registrations").await
  }

  /// `DELETE /api/events/:id/registrations`
  pub async fn cancel(&self, event_id: Uuid) -> Result<Cancellation> {
    let req = self.client.delete(self.url(&format!("/events/{event_id}/registrations")));
    self.fetch(req, "DELETE /events/:id/registrations").await
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  /// `GET /api/notifications`
  pub async fn list_notifications(&self) -> Result<Vec<Notification>> {
    self.fetch(self.client.get(self.url("/notifications")), "GET /notifications").await
  }

  /// `POST /api/notifications/:id/read`
  pub async fn mark_read(&self, notification_id: Uuid) -> Result<Notification> {
    let req = self.client.post(self.url(&format!("/notifications/{notification_id}/read")));
    self.fetch(req, "POST /notifications/:id/read").await
  }
}

/// The `error` field of an API error body, or the raw body if it has none.
fn error_message(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_else(|| body.trim().to_owned())
}
