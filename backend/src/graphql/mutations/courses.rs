use super::prelude::*;

#[derive(Default)]
pub struct CourseMutations;

#[Object]
impl CourseMutations {
    #[graphql(guard = "AdminGuard")]
    async fn create_course(&self, ctx: &Context<'_>, input: CreateCourseInput) -> Result<CourseResult> {
        require_non_empty("name", &input.name)?;
        let db = ctx.data_unchecked::<Database>();

        if db.subjects().get(&input.subject_id).await.map_err(internal)?.is_none() {
            return Err(not_found("Subject", &input.subject_id));
        }

        let created = db
            .courses()
            .create(CreateCourse {
                name: input.name,
                year: input.year as i64,
                period: input.period as i64,
                subject_id: input.subject_id,
                organization: input.organization.filter(|o| !o.trim().is_empty()),
            })
            .await;

        match created {
            Ok(record) => {
                tracing::info!(course_id = %record.id, "Course created");
                Ok(CourseResult::ok(Course::from(record)))
            }
            Err(e) => Ok(CourseResult::failure(e.to_string())),
        }
    }

    async fn update_course(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateCourseInput,
    ) -> Result<CourseResult> {
        require_course_permission(ctx, &id, Permission::EditCourse).await?;
        let db = ctx.data_unchecked::<Database>();

        let updated = db
            .courses()
            .update(
                &id,
                UpdateCourse {
                    name: input.name,
                    year: input.year.map(i64::from),
                    period: input.period.map(i64::from),
                    organization: nullable_update(input.organization),
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(CourseResult::ok(Course::from(record))),
            Ok(None) => Err(not_found("Course", &id)),
            Err(e) => Ok(CourseResult::failure(e.to_string())),
        }
    }
}
