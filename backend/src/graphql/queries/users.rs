use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// The authenticated user
    #[graphql(guard = "AuthGuard")]
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        db.users()
            .get_by_id(&user.user_id)
            .await
            .map_err(internal)?
            .map(User::from)
            .ok_or_else(|| not_found("User", &user.user_id))
    }

    /// URL that starts the GitHub sign-in flow
    async fn github_login_url(&self, ctx: &Context<'_>, state: String) -> Result<String> {
        let github = ctx.data_unchecked::<Arc<dyn GithubClient>>();
        github
            .authorize_url(&state)
            .map_err(|e| async_graphql::Error::new(e.to_string()))
    }

    /// Members of a course, or every user (administrators only) when no
    /// course is given
    #[graphql(guard = "AuthGuard")]
    async fn users(&self, ctx: &Context<'_>, course_id: Option<String>) -> Result<Vec<User>> {
        let db = ctx.data_unchecked::<Database>();

        let records = match course_id {
            Some(course_id) => {
                require_course_permission(ctx, &course_id, Permission::ViewCourse).await?;
                db.users().list_by_course(&course_id).await
            }
            None => {
                if !ctx.auth_user()?.is_admin {
                    return Err(forbidden("Administrator access required"));
                }
                db.users().list_all().await
            }
        }
        .map_err(internal)?;

        Ok(records.into_iter().map(User::from).collect())
    }

    #[graphql(guard = "AuthGuard")]
    async fn user(&self, ctx: &Context<'_>, id: String) -> Result<Option<User>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.users().get_by_id(&id).await.map_err(internal)?;
        Ok(record.map(User::from))
    }
}
