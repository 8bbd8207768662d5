use super::prelude::*;

#[derive(Default)]
pub struct RoleQueries;

#[Object]
impl RoleQueries {
    #[graphql(guard = "AuthGuard")]
    async fn roles(&self, ctx: &Context<'_>) -> Result<Vec<Role>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.roles().list().await.map_err(internal)?;
        Ok(records.into_iter().map(Role::from).collect())
    }

    #[graphql(guard = "AuthGuard")]
    async fn role(&self, ctx: &Context<'_>, id: String) -> Result<Option<Role>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.roles().get(&id).await.map_err(internal)?;
        Ok(record.map(Role::from))
    }

    /// Memberships of a course
    async fn user_roles(&self, ctx: &Context<'_>, course_id: String) -> Result<Vec<UserRole>> {
        require_course_permission(ctx, &course_id, Permission::ViewCourse).await?;
        let db = ctx.data_unchecked::<Database>();
        let records = db.user_roles().list_by_course(&course_id).await.map_err(internal)?;
        Ok(records.into_iter().map(UserRole::from).collect())
    }
}
