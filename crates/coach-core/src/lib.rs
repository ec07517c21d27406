//! Core types and policy for the coaching platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.
//!
//! The two policy components are [`access`] (who may enroll in a course)
//! and [`registration`] (event capacity and waitlist). [`workflow`] wires
//! them to a [`store::CoachStore`] together with authorization and
//! notification side effects.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod community;
pub mod course;
pub mod error;
pub mod event;
pub mod identity;
pub mod notification;
pub mod registration;
pub mod store;
pub mod workflow;

pub use error::{Decision, Error, Rejection, Result};
