use super::prelude::*;

#[derive(Default)]
pub struct AssignmentQueries;

#[Object]
impl AssignmentQueries {
    async fn assignments(&self, ctx: &Context<'_>, course_id: String) -> Result<Vec<Assignment>> {
        require_course_permission(ctx, &course_id, Permission::ViewCourse).await?;
        let db = ctx.data_unchecked::<Database>();
        let records = db.assignments().list_by_course(&course_id).await.map_err(internal)?;
        Ok(records.into_iter().map(Assignment::from).collect())
    }

    async fn assignment(&self, ctx: &Context<'_>, id: String) -> Result<Option<Assignment>> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let Some(record) = db.assignments().get(&id).await.map_err(internal)? else {
            return Ok(None);
        };
        require_course_permission(ctx, &record.course_id, Permission::ViewCourse).await?;

        Ok(Some(Assignment::from(record)))
    }
}
