//! HTTP routes
//!
//! The primary API is GraphQL at /graphql; health probes are plain JSON.

pub mod graphql;
pub mod health;
