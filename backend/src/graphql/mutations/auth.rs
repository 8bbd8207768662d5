//! GraphQL authentication mutations
//!
//! Sign-in goes through GitHub OAuth: the client sends the code GitHub
//! returned to the callback URL. Neither mutation requires authentication.
//! Rejections come back as a failed `AuthResult`, not as GraphQL errors.

use super::prelude::*;
use crate::services::{AuthService, LoginResult, RegisterInput};

fn session(result: LoginResult) -> AuthResult {
    AuthResult::ok(AuthSession {
        token: result.token,
        user: User::from(result.user),
    })
}

#[derive(Default)]
pub struct AuthMutations;

#[Object]
impl AuthMutations {
    /// Sign in with a GitHub OAuth code
    async fn login(&self, ctx: &Context<'_>, code: String) -> Result<AuthResult> {
        let auth_service = ctx.data_unchecked::<AuthService>();

        match auth_service.login(&code).await {
            Ok(result) => Ok(session(result)),
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                Ok(AuthResult::failure(e.to_string()))
            }
        }
    }

    /// Create an account for the GitHub user behind the OAuth code
    async fn register(
        &self,
        ctx: &Context<'_>,
        code: String,
        input: RegisterUserInput,
    ) -> Result<AuthResult> {
        require_non_empty("name", &input.name)?;
        require_non_empty("lastName", &input.last_name)?;
        let auth_service = ctx.data_unchecked::<AuthService>();

        let register_input = RegisterInput {
            name: input.name,
            last_name: input.last_name,
            file: input.file,
            notification_email: input.notification_email,
        };

        match auth_service.register(&code, register_input).await {
            Ok(result) => Ok(session(result)),
            Err(e) => {
                tracing::warn!(error = %e, "User registration failed");
                Ok(AuthResult::failure(e.to_string()))
            }
        }
    }
}
