//! Submissions and reviews
//!
//! Holders of `VIEW_ALL_SUBMISSIONS` see everything in the course; other
//! members only see what they (or their group) handed in and its review.

use super::prelude::*;

#[derive(Default)]
pub struct SubmissionQueries;

/// Whether the caller may see every submission of the assignment's course
async fn sees_all_submissions(ctx: &Context<'_>, assignment: &AssignmentRecord) -> Result<bool> {
    if has_course_permission(ctx, &assignment.course_id, Permission::ViewAllSubmissions).await? {
        return Ok(true);
    }
    require_course_permission(ctx, &assignment.course_id, Permission::ViewCourse).await?;
    Ok(false)
}

async fn load_assignment(ctx: &Context<'_>, id: &str) -> Result<AssignmentRecord> {
    ctx.data_unchecked::<Database>()
        .assignments()
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Assignment", id))
}

/// Submissions of the assignment visible to the caller
async fn visible_submissions(
    ctx: &Context<'_>,
    assignment: &AssignmentRecord,
) -> Result<Vec<SubmissionRecord>> {
    let submissions = ctx.data_unchecked::<Database>().submissions();

    let records = if sees_all_submissions(ctx, assignment).await? {
        submissions.list_by_assignment(&assignment.id).await
    } else {
        let user = ctx.auth_user()?;
        submissions.list_for_user(&assignment.id, &user.user_id).await
    };

    records.map_err(internal)
}

#[Object]
impl SubmissionQueries {
    async fn submissions(
        &self,
        ctx: &Context<'_>,
        assignment_id: String,
    ) -> Result<Vec<Submission>> {
        ctx.auth_user()?;
        let assignment = load_assignment(ctx, &assignment_id).await?;
        let records = visible_submissions(ctx, &assignment).await?;
        Ok(records.into_iter().map(Submission::from).collect())
    }

    async fn submission(&self, ctx: &Context<'_>, id: String) -> Result<Option<Submission>> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let Some(record) = db.submissions().get(&id).await.map_err(internal)? else {
            return Ok(None);
        };
        let assignment = load_assignment(ctx, &record.assignment_id).await?;

        let visible = visible_submissions(ctx, &assignment).await?;
        if !visible.iter().any(|s| s.id == record.id) {
            return Err(forbidden("Submission belongs to another student"));
        }

        Ok(Some(Submission::from(record)))
    }

    async fn reviews(&self, ctx: &Context<'_>, assignment_id: String) -> Result<Vec<Review>> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let assignment = load_assignment(ctx, &assignment_id).await?;

        let records = db
            .reviews()
            .list_by_assignment(&assignment.id)
            .await
            .map_err(internal)?;

        if sees_all_submissions(ctx, &assignment).await? {
            return Ok(records.into_iter().map(Review::from).collect());
        }

        let own: Vec<String> = visible_submissions(ctx, &assignment)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();

        Ok(records
            .into_iter()
            .filter(|r| own.contains(&r.submission_id))
            .map(Review::from)
            .collect())
    }

    async fn review(&self, ctx: &Context<'_>, id: String) -> Result<Option<Review>> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let Some(record) = db.reviews().get(&id).await.map_err(internal)? else {
            return Ok(None);
        };
        let submission = db
            .submissions()
            .get(&record.submission_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| not_found("Submission", &record.submission_id))?;
        let assignment = load_assignment(ctx, &submission.assignment_id).await?;

        let visible = visible_submissions(ctx, &assignment).await?;
        if !visible.iter().any(|s| s.id == submission.id) {
            return Err(forbidden("Review belongs to another student"));
        }

        Ok(Some(Review::from(record)))
    }
}
