//! SQLite backend for the coaching platform store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Registration, cancellation and lesson
//! completion each run in a single `BEGIN IMMEDIATE` transaction, which
//! holds the database write lock across their read-decide-write sequence.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
