use super::prelude::*;

#[derive(Default)]
pub struct RepositoryQueries;

#[Object]
impl RepositoryQueries {
    async fn repositories(&self, ctx: &Context<'_>, course_id: String) -> Result<Vec<Repository>> {
        require_course_permission(ctx, &course_id, Permission::ViewCourse).await?;
        let repositories = ctx.data_unchecked::<Database>().repositories();

        let records = repositories.list_by_course(&course_id).await.map_err(internal)?;
        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let user_ids = repositories.list_user_ids(&record.id).await.map_err(internal)?;
            result.push(Repository::new(record, user_ids));
        }

        Ok(result)
    }

    async fn repository(&self, ctx: &Context<'_>, id: String) -> Result<Option<Repository>> {
        ctx.auth_user()?;
        let repositories = ctx.data_unchecked::<Database>().repositories();

        let Some(record) = repositories.get(&id).await.map_err(internal)? else {
            return Ok(None);
        };
        require_course_permission(ctx, &record.course_id, Permission::ViewCourse).await?;

        let user_ids = repositories.list_user_ids(&record.id).await.map_err(internal)?;
        Ok(Some(Repository::new(record, user_ids)))
    }
}
