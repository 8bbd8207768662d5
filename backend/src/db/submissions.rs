//! Submissions repository
//!
//! A submission is a pull request handed in for an assignment, either by a
//! single user or by a group.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const SUBMISSION_COLUMNS: &str = "id, assignment_id, submitter_user_id, submitter_group_id, description, pull_request_url, submitted_at, submitted_again_at, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: String,
    pub assignment_id: String,
    pub submitter_user_id: Option<String>,
    pub submitter_group_id: Option<String>,
    pub description: Option<String>,
    pub pull_request_url: String,
    pub submitted_at: String,
    pub submitted_again_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Who handed the submission in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitter {
    User(String),
    Group(String),
}

#[derive(Debug, Clone)]
pub struct CreateSubmission {
    pub assignment_id: String,
    pub submitter: Submitter,
    pub description: Option<String>,
    pub pull_request_url: String,
}

pub struct SubmissionRepository {
    pool: SqlitePool,
}

impl SubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<SubmissionRecord>> {
        let record = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "SELECT {} FROM submissions WHERE id = ?",
            SUBMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_by_assignment(&self, assignment_id: &str) -> Result<Vec<SubmissionRecord>> {
        let records = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "SELECT {} FROM submissions WHERE assignment_id = ? ORDER BY submitted_at",
            SUBMISSION_COLUMNS
        ))
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Submissions of an assignment handed in by the user or by one of the
    /// user's active groups
    pub async fn list_for_user(
        &self,
        assignment_id: &str,
        user_id: &str,
    ) -> Result<Vec<SubmissionRecord>> {
        let records = sqlx::query_as::<_, SubmissionRecord>(&format!(
            r#"
            SELECT {} FROM submissions
            WHERE assignment_id = ?
              AND (submitter_user_id = ?
                   OR submitter_group_id IN (
                        SELECT group_id FROM group_participants WHERE user_id = ? AND active = 1
                   ))
            ORDER BY submitted_at
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(assignment_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Existing submission for the same submitter and assignment
    pub async fn find_existing(
        &self,
        assignment_id: &str,
        submitter: &Submitter,
    ) -> Result<Option<SubmissionRecord>> {
        let (column, value) = match submitter {
            Submitter::User(id) => ("submitter_user_id", id),
            Submitter::Group(id) => ("submitter_group_id", id),
        };

        let record = sqlx::query_as::<_, SubmissionRecord>(&format!(
            "SELECT {} FROM submissions WHERE assignment_id = ? AND {} = ?",
            SUBMISSION_COLUMNS, column
        ))
        .bind(assignment_id)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn create(&self, data: CreateSubmission) -> Result<SubmissionRecord> {
        let id = new_id();
        let now = now_iso8601();
        let (user_id, group_id) = match &data.submitter {
            Submitter::User(id) => (Some(id.as_str()), None),
            Submitter::Group(id) => (None, Some(id.as_str())),
        };

        sqlx::query(
            r#"
            INSERT INTO submissions (
                id, assignment_id, submitter_user_id, submitter_group_id, description,
                pull_request_url, submitted_at, submitted_again_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.assignment_id)
        .bind(user_id)
        .bind(group_id)
        .bind(&data.description)
        .bind(&data.pull_request_url)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create submission"))
    }

    /// Mark a submission as handed in again, optionally replacing its description
    pub async fn resubmit(
        &self,
        id: &str,
        description: Option<String>,
    ) -> Result<Option<SubmissionRecord>> {
        let now = now_iso8601();
        let result = sqlx::query(
            r#"
            UPDATE submissions
            SET submitted_again_at = ?,
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&now)
        .bind(description)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_fixtures::{assignment, course, user};
    use crate::db::{CreateGroup, Database};

    #[tokio::test]
    async fn test_list_for_user_includes_group_submissions() {
        let db = Database::in_memory().await.unwrap();
        let course = course(&db).await;
        let tp = assignment(&db, &course.id, true).await;
        let ada = user(&db, "ada").await;
        let alan = user(&db, "alan").await;

        let group = db
            .groups()
            .create(CreateGroup {
                course_id: course.id.clone(),
                name: "Grupo 1".to_string(),
            })
            .await
            .unwrap();
        db.groups().add_participant(&group.id, &ada.id).await.unwrap();

        let submitted = db
            .submissions()
            .create(CreateSubmission {
                assignment_id: tp.id.clone(),
                submitter: Submitter::Group(group.id.clone()),
                description: None,
                pull_request_url: "https://github.com/org/tp1/pull/1".to_string(),
            })
            .await
            .unwrap();

        let for_ada = db.submissions().list_for_user(&tp.id, &ada.id).await.unwrap();
        assert_eq!(for_ada.len(), 1);
        assert_eq!(for_ada[0].id, submitted.id);
        assert!(db.submissions().list_for_user(&tp.id, &alan.id).await.unwrap().is_empty());

        let existing = db
            .submissions()
            .find_existing(&tp.id, &Submitter::Group(group.id.clone()))
            .await
            .unwrap();
        assert!(existing.is_some());
    }

    #[tokio::test]
    async fn test_resubmit_sets_timestamp() {
        let db = Database::in_memory().await.unwrap();
        let course = course(&db).await;
        let tp = assignment(&db, &course.id, false).await;
        let ada = user(&db, "ada").await;

        let submission = db
            .submissions()
            .create(CreateSubmission {
                assignment_id: tp.id.clone(),
                submitter: Submitter::User(ada.id.clone()),
                description: Some("first".to_string()),
                pull_request_url: "https://github.com/org/tp1/pull/2".to_string(),
            })
            .await
            .unwrap();
        assert!(submission.submitted_again_at.is_none());

        let again = db.submissions().resubmit(&submission.id, None).await.unwrap().unwrap();
        assert!(again.submitted_again_at.is_some());
        assert_eq!(again.description.as_deref(), Some("first"));
    }
}
