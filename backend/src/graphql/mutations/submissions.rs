//! Submissions and reviews
//!
//! Deadline and duplicate checks are business rejections reported through
//! the payload; malformed input is a `BAD_USER_INPUT` error.

use chrono::Utc;
use url::Url;

use super::prelude::*;

#[derive(Default)]
pub struct SubmissionMutations;

async fn load_assignment(db: &Database, id: &str) -> Result<AssignmentRecord> {
    db.assignments()
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Assignment", id))
}

async fn load_submission(db: &Database, id: &str) -> Result<SubmissionRecord> {
    db.submissions()
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Submission", id))
}

/// Message explaining why the assignment no longer takes submissions
fn closed_reason(assignment: &AssignmentRecord) -> Result<Option<&'static str>> {
    if !assignment.active {
        return Ok(Some("Assignment is not active"));
    }
    if assignment.allow_late_submissions {
        return Ok(None);
    }

    let end = parse_datetime(assignment.end_date.as_deref())?;
    match end {
        Some(end) if Utc::now() > end => Ok(Some("The submission deadline has passed")),
        _ => Ok(None),
    }
}

fn validate_pull_request_url(value: &str) -> Result<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(bad_input(format!("Invalid pull request URL: {}", value))),
    }
}

/// Whether `user_id` handed the submission in, alone or through their group
async fn is_submitter(db: &Database, submission: &SubmissionRecord, user_id: &str) -> Result<bool> {
    if submission.submitter_user_id.as_deref() == Some(user_id) {
        return Ok(true);
    }
    let Some(group_id) = submission.submitter_group_id.as_deref() else {
        return Ok(false);
    };

    let participants = db.groups().list_participants(group_id).await.map_err(internal)?;
    Ok(participants.iter().any(|p| p.user_id == user_id))
}

/// Load a review's submission and check the caller may grade it
async fn authorize_review(ctx: &Context<'_>, submission_id: &str) -> Result<AuthUser> {
    let db = ctx.data_unchecked::<Database>();
    let submission = load_submission(db, submission_id).await?;
    let assignment = load_assignment(db, &submission.assignment_id).await?;
    require_course_permission(ctx, &assignment.course_id, Permission::SetReview).await
}

#[Object]
impl SubmissionMutations {
    /// Hand in a pull request. Group assignments are submitted on behalf of
    /// the caller's group in the course.
    async fn create_submission(
        &self,
        ctx: &Context<'_>,
        input: CreateSubmissionInput,
    ) -> Result<SubmissionResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let assignment = load_assignment(db, &input.assignment_id).await?;
        let user =
            require_course_permission(ctx, &assignment.course_id, Permission::SubmitAssignment)
                .await?;
        validate_pull_request_url(&input.pull_request_url)?;

        if let Some(reason) = closed_reason(&assignment)? {
            return Ok(SubmissionResult::failure(reason));
        }

        let submitter = if assignment.is_group {
            let group = db
                .groups()
                .find_for_user_in_course(&user.user_id, &assignment.course_id)
                .await
                .map_err(internal)?;
            match group {
                Some(group) => Submitter::Group(group.id),
                None => {
                    return Ok(SubmissionResult::failure(
                        "Group assignments require membership in a group",
                    ));
                }
            }
        } else {
            Submitter::User(user.user_id.clone())
        };

        let existing = db
            .submissions()
            .find_existing(&assignment.id, &submitter)
            .await
            .map_err(internal)?;
        if existing.is_some() {
            return Ok(SubmissionResult::failure(
                "Assignment already submitted, use resubmit instead",
            ));
        }

        let created = db
            .submissions()
            .create(CreateSubmission {
                assignment_id: assignment.id,
                submitter,
                description: input.description,
                pull_request_url: input.pull_request_url,
            })
            .await;

        match created {
            Ok(record) => {
                tracing::info!(
                    submission_id = %record.id,
                    assignment_id = %record.assignment_id,
                    user_id = %user.user_id,
                    "Submission created"
                );
                Ok(SubmissionResult::ok(Submission::from(record)))
            }
            Err(e) => Ok(SubmissionResult::failure(e.to_string())),
        }
    }

    /// Hand a submission in again after a revision
    #[graphql(guard = "AuthGuard")]
    async fn resubmit(
        &self,
        ctx: &Context<'_>,
        id: String,
        description: Option<String>,
    ) -> Result<SubmissionResult> {
        let user = ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let submission = load_submission(db, &id).await?;

        if !is_submitter(db, &submission, &user.user_id).await? {
            return Err(forbidden("Only the submitter can resubmit"));
        }

        let assignment = load_assignment(db, &submission.assignment_id).await?;
        if let Some(reason) = closed_reason(&assignment)? {
            return Ok(SubmissionResult::failure(reason));
        }

        match db.submissions().resubmit(&id, description).await {
            Ok(Some(record)) => Ok(SubmissionResult::ok(Submission::from(record))),
            Ok(None) => Err(not_found("Submission", &id)),
            Err(e) => Ok(SubmissionResult::failure(e.to_string())),
        }
    }

    async fn create_review(&self, ctx: &Context<'_>, input: CreateReviewInput) -> Result<ReviewResult> {
        ctx.auth_user()?;
        let reviewer = authorize_review(ctx, &input.submission_id).await?;
        validate_grade(input.grade)?;
        let db = ctx.data_unchecked::<Database>();

        let existing = db
            .reviews()
            .get_by_submission(&input.submission_id)
            .await
            .map_err(internal)?;
        if existing.is_some() {
            return Ok(ReviewResult::failure(
                "Submission already reviewed, use updateReview instead",
            ));
        }

        let created = db
            .reviews()
            .create(CreateReview {
                submission_id: input.submission_id,
                reviewer_user_id: reviewer.user_id,
                grade: input.grade.map(i64::from),
                revision_requested: input.revision_requested,
            })
            .await;

        match created {
            Ok(record) => Ok(ReviewResult::ok(Review::from(record))),
            Err(e) => Ok(ReviewResult::failure(e.to_string())),
        }
    }

    async fn update_review(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateReviewInput,
    ) -> Result<ReviewResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let review = db
            .reviews()
            .get(&id)
            .await
            .map_err(internal)?
            .ok_or_else(|| not_found("Review", &id))?;
        authorize_review(ctx, &review.submission_id).await?;

        let grade = nullable_update(input.grade);
        if let Some(value) = grade {
            validate_grade(value)?;
        }

        let updated = db
            .reviews()
            .update(
                &id,
                UpdateReview {
                    grade: grade.map(|g| g.map(i64::from)),
                    revision_requested: input.revision_requested,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(ReviewResult::ok(Review::from(record))),
            Ok(None) => Err(not_found("Review", &id)),
            Err(e) => Ok(ReviewResult::failure(e.to_string())),
        }
    }
}
