//! GraphQL authentication and authorization
//!
//! The HTTP handler verifies the bearer token and inserts an [`AuthUser`]
//! into the request data. Resolvers read it through [`AuthExt`].
//!
//! ## Guards
//!
//! ```ignore
//! #[graphql(guard = "AuthGuard")]
//! async fn me(&self, ctx: &Context<'_>) -> Result<User> { ... }
//!
//! #[graphql(guard = "AdminGuard")]
//! async fn create_subject(&self, ctx: &Context<'_>, input: CreateSubjectInput) -> Result<SubjectResult> { ... }
//! ```
//!
//! Course-scoped rules depend on arguments, so they are checked inside the
//! resolver with [`require_course_permission`].

use async_graphql::{Context, ErrorExtensions, Result};
use serde::{Deserialize, Serialize};

use crate::db::{Database, Permission};
use crate::services::AccessTokenClaims;

use super::helpers::{forbidden, internal};

/// User context extracted from the JWT, available in GraphQL resolvers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub github_id: String,
    pub is_admin: bool,
}

impl From<AccessTokenClaims> for AuthUser {
    fn from(claims: AccessTokenClaims) -> Self {
        Self {
            user_id: claims.sub,
            github_id: claims.github_id,
            is_admin: claims.is_admin,
        }
    }
}

/// Extension trait to get authenticated user from GraphQL context
pub trait AuthExt {
    /// Get the authenticated user, or return an error if not authenticated
    fn auth_user(&self) -> Result<&AuthUser>;
}

impl<'a> AuthExt for Context<'a> {
    fn auth_user(&self) -> Result<&AuthUser> {
        self.data_opt::<AuthUser>().ok_or_else(|| {
            async_graphql::Error::new("Authentication required")
                .extend_with(|_, e| e.set("code", "UNAUTHORIZED"))
        })
    }
}

/// Guard that requires authentication
pub struct AuthGuard;

impl async_graphql::Guard for AuthGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.auth_user().map(|_| ());
        async move { result }
    }
}

/// Guard that requires an administrator
pub struct AdminGuard;

impl async_graphql::Guard for AdminGuard {
    fn check(&self, ctx: &Context<'_>) -> impl std::future::Future<Output = Result<()>> + Send {
        let result = ctx.auth_user().and_then(|user| {
            if user.is_admin {
                Ok(())
            } else {
                Err(forbidden("Administrator access required"))
            }
        });
        async move { result }
    }
}

/// Whether the caller holds `permission` in the course. Administrators hold
/// every permission.
pub async fn has_course_permission(
    ctx: &Context<'_>,
    course_id: &str,
    permission: Permission,
) -> Result<bool> {
    let user = ctx.auth_user()?;
    if user.is_admin {
        return Ok(true);
    }

    ctx.data_unchecked::<Database>()
        .user_roles()
        .has_permission(&user.user_id, course_id, permission)
        .await
        .map_err(internal)
}

/// Fail with `FORBIDDEN` unless the caller holds `permission` in the course
pub async fn require_course_permission(
    ctx: &Context<'_>,
    course_id: &str,
    permission: Permission,
) -> Result<AuthUser> {
    if !has_course_permission(ctx, course_id, permission).await? {
        tracing::debug!(course_id, permission = %permission, "Course permission denied");
        return Err(forbidden(format!("Missing permission {} in course", permission)));
    }

    Ok(ctx.auth_user()?.clone())
}

/// Fail with `FORBIDDEN` unless the caller is `user_id` or an administrator
pub fn require_self_or_admin<'a>(ctx: &'a Context<'_>, user_id: &str) -> Result<&'a AuthUser> {
    let user = ctx.auth_user()?;
    if user.is_admin || user.user_id == user_id {
        Ok(user)
    } else {
        Err(forbidden("Only the user or an administrator can do this"))
    }
}
