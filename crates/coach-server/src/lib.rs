//! HTTP server wiring for the coaching platform.
//!
//! Mounts the JSON API from `coach-api` under `/api`, adds request tracing
//! and a liveness check, and owns the server configuration.

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use coach_api::api_router;
use coach_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `COACH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("coach.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level [`Router`] for the server.
pub fn router(store: Arc<SqliteStore>) -> Router {
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api_router(store))
    .layer(TraceLayer::new_for_http())
}
