use super::prelude::*;

#[derive(Default)]
pub struct CourseQueries;

#[Object]
impl CourseQueries {
    /// Courses visible to the caller: every course for administrators,
    /// otherwise the courses the caller is an active member of
    #[graphql(guard = "AuthGuard")]
    async fn courses(
        &self,
        ctx: &Context<'_>,
        subject_id: Option<String>,
        active: Option<bool>,
    ) -> Result<Vec<Course>> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let filter = CourseFilter {
            subject_id,
            active,
            member_user_id: (!user.is_admin).then(|| user.user_id.clone()),
        };

        let records = db.courses().list(&filter).await.map_err(internal)?;
        Ok(records.into_iter().map(Course::from).collect())
    }

    async fn course(&self, ctx: &Context<'_>, id: String) -> Result<Option<Course>> {
        require_course_permission(ctx, &id, Permission::ViewCourse).await?;
        let db = ctx.data_unchecked::<Database>();
        let record = db.courses().get(&id).await.map_err(internal)?;
        Ok(record.map(Course::from))
    }
}
