use super::prelude::*;

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Create a user ahead of their first GitHub sign-in
    #[graphql(guard = "AdminGuard")]
    async fn create_user(&self, ctx: &Context<'_>, input: CreateUserInput) -> Result<UserResult> {
        require_non_empty("githubId", &input.github_id)?;
        let db = ctx.data_unchecked::<Database>();

        let created = db
            .users()
            .create(CreateUser {
                name: input.name,
                last_name: input.last_name,
                file: input.file,
                github_id: input.github_id.trim().to_string(),
                notification_email: input.notification_email,
                is_admin: input.is_admin,
            })
            .await;

        match created {
            Ok(record) => Ok(UserResult::ok(User::from(record))),
            Err(e) => Ok(UserResult::failure(e.to_string())),
        }
    }

    /// Update a profile. Users may edit their own; `isAdmin` and `active`
    /// are reserved to administrators.
    #[graphql(guard = "AuthGuard")]
    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateUserInput,
    ) -> Result<UserResult> {
        let caller = require_self_or_admin(ctx, &id)?;
        if !caller.is_admin && (input.is_admin.is_some() || input.active.is_some()) {
            return Err(forbidden("Only administrators can change isAdmin or active"));
        }

        let db = ctx.data_unchecked::<Database>();
        let updated = db
            .users()
            .update(
                &id,
                UpdateUser {
                    name: input.name,
                    last_name: input.last_name,
                    file: nullable_update(input.file),
                    notification_email: nullable_update(input.notification_email),
                    is_admin: input.is_admin,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(UserResult::ok(User::from(record))),
            Ok(None) => Err(not_found("User", &id)),
            Err(e) => Ok(UserResult::failure(e.to_string())),
        }
    }
}
