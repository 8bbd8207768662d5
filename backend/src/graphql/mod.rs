//! GraphQL API
//!
//! The single API surface of the backend, served at `/graphql`. Queries and
//! mutations are split per domain under `queries/` and `mutations/` and
//! merged in `schema.rs`.

pub mod auth;
pub mod helpers;
pub mod mutations;
pub mod queries;
mod schema;
pub mod types;

pub use auth::AuthUser;
pub use schema::{MutationRoot, QueryRoot, TeachHubSchema, build_schema};
