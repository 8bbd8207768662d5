use super::prelude::*;

#[derive(Default)]
pub struct GroupQueries;

#[Object]
impl GroupQueries {
    async fn groups(&self, ctx: &Context<'_>, course_id: String) -> Result<Vec<Group>> {
        require_course_permission(ctx, &course_id, Permission::ViewCourse).await?;
        let groups = ctx.data_unchecked::<Database>().groups();

        let records = groups.list_by_course(&course_id).await.map_err(internal)?;
        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let participants = groups.list_participants(&record.id).await.map_err(internal)?;
            result.push(Group::new(record, participants));
        }

        Ok(result)
    }

    async fn group(&self, ctx: &Context<'_>, id: String) -> Result<Option<Group>> {
        ctx.auth_user()?;
        let groups = ctx.data_unchecked::<Database>().groups();

        let Some(record) = groups.get(&id).await.map_err(internal)? else {
            return Ok(None);
        };
        require_course_permission(ctx, &record.course_id, Permission::ViewCourse).await?;

        let participants = groups.list_participants(&record.id).await.map_err(internal)?;
        Ok(Some(Group::new(record, participants)))
    }
}
