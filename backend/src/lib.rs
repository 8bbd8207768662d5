//! TeachHub backend
//!
//! Course management for programming classes: subjects, courses, members and
//! their roles, assignments, group work, pull-request submissions, reviews,
//! and bulk provisioning of GitHub repositories for students. Everything is
//! exposed via GraphQL at /graphql.

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod graphql;
pub mod services;

pub use app::{AppState, build_app};
