use super::prelude::*;

#[derive(Default)]
pub struct AssignmentMutations;

#[Object]
impl AssignmentMutations {
    async fn create_assignment(
        &self,
        ctx: &Context<'_>,
        input: CreateAssignmentInput,
    ) -> Result<AssignmentResult> {
        require_course_permission(ctx, &input.course_id, Permission::ManageAssignments).await?;
        require_non_empty("title", &input.title)?;

        let start = parse_datetime(input.start_date.as_deref())?;
        let end = parse_datetime(input.end_date.as_deref())?;
        validate_date_range(start, end)?;

        let db = ctx.data_unchecked::<Database>();
        let created = db
            .assignments()
            .create(CreateAssignment {
                course_id: input.course_id,
                title: input.title,
                description: input.description,
                link: input.link,
                start_date: start.map(|d| d.to_rfc3339()),
                end_date: end.map(|d| d.to_rfc3339()),
                allow_late_submissions: input.allow_late_submissions,
                is_group: input.is_group,
            })
            .await;

        match created {
            Ok(record) => Ok(AssignmentResult::ok(Assignment::from(record))),
            Err(e) => Ok(AssignmentResult::failure(e.to_string())),
        }
    }

    async fn update_assignment(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateAssignmentInput,
    ) -> Result<AssignmentResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let existing = db
            .assignments()
            .get(&id)
            .await
            .map_err(internal)?
            .ok_or_else(|| not_found("Assignment", &id))?;
        require_course_permission(ctx, &existing.course_id, Permission::ManageAssignments).await?;

        let start_date = normalize_date_update(nullable_update(input.start_date))?;
        let end_date = normalize_date_update(nullable_update(input.end_date))?;

        // Check the range the row will end up with, not only the supplied fields
        let effective_start = match &start_date {
            Some(value) => value.clone(),
            None => existing.start_date.clone(),
        };
        let effective_end = match &end_date {
            Some(value) => value.clone(),
            None => existing.end_date.clone(),
        };
        validate_date_range(
            parse_datetime(effective_start.as_deref())?,
            parse_datetime(effective_end.as_deref())?,
        )?;

        let updated = db
            .assignments()
            .update(
                &id,
                UpdateAssignment {
                    title: input.title,
                    description: nullable_update(input.description),
                    link: nullable_update(input.link),
                    start_date,
                    end_date,
                    allow_late_submissions: input.allow_late_submissions,
                    is_group: input.is_group,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(AssignmentResult::ok(Assignment::from(record))),
            Ok(None) => Err(not_found("Assignment", &id)),
            Err(e) => Ok(AssignmentResult::failure(e.to_string())),
        }
    }
}

fn normalize_date_update(value: Option<Option<String>>) -> Result<Option<Option<String>>> {
    match value {
        Some(Some(date)) => sqlite_helpers::normalize_datetime_opt(Some(&date))
            .map(Some)
            .map_err(|e| bad_input(e.to_string())),
        other => Ok(other),
    }
}
