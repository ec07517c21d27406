//! Error type for `coach-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] coach_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An update targeted a course that does not exist.
  #[error("course not found: {0}")]
  CourseNotFound(uuid::Uuid),

  /// An update targeted an event that does not exist.
  #[error("event not found: {0}")]
  EventNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
