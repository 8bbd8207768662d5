//! Reviews repository
//!
//! Each submission has at most one review. Updating it after the first
//! pass records `reviewed_again_at`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const REVIEW_COLUMNS: &str = "id, submission_id, reviewer_user_id, grade, revision_requested, reviewed_at, reviewed_again_at, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: String,
    pub submission_id: String,
    pub reviewer_user_id: String,
    pub grade: Option<i64>,
    pub revision_requested: bool,
    pub reviewed_at: String,
    pub reviewed_again_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateReview {
    pub submission_id: String,
    pub reviewer_user_id: String,
    pub grade: Option<i64>,
    pub revision_requested: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateReview {
    pub grade: Option<Option<i64>>,
    pub revision_requested: Option<bool>,
}

pub struct ReviewRepository {
    pool: SqlitePool,
}

impl ReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {} FROM reviews WHERE id = ?",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn get_by_submission(&self, submission_id: &str) -> Result<Option<ReviewRecord>> {
        let record = sqlx::query_as::<_, ReviewRecord>(&format!(
            "SELECT {} FROM reviews WHERE submission_id = ?",
            REVIEW_COLUMNS
        ))
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_by_assignment(&self, assignment_id: &str) -> Result<Vec<ReviewRecord>> {
        let records = sqlx::query_as::<_, ReviewRecord>(
            r#"
            SELECT r.id, r.submission_id, r.reviewer_user_id, r.grade, r.revision_requested,
                   r.reviewed_at, r.reviewed_again_at, r.created_at, r.updated_at
            FROM reviews r
            JOIN submissions s ON s.id = r.submission_id
            WHERE s.assignment_id = ?
            ORDER BY r.reviewed_at
            "#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn create(&self, data: CreateReview) -> Result<ReviewRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO reviews (
                id, submission_id, reviewer_user_id, grade, revision_requested,
                reviewed_at, reviewed_again_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.submission_id)
        .bind(&data.reviewer_user_id)
        .bind(data.grade)
        .bind(data.revision_requested)
        .bind(&now)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create review"))
    }

    pub async fn update(&self, id: &str, data: UpdateReview) -> Result<Option<ReviewRecord>> {
        let mut set_clauses = vec!["updated_at = ?", "reviewed_again_at = ?"];
        if data.grade.is_some() {
            set_clauses.push("grade = ?");
        }
        if data.revision_requested.is_some() {
            set_clauses.push("revision_requested = ?");
        }

        let now = now_iso8601();
        let query = format!("UPDATE reviews SET {} WHERE id = ?", set_clauses.join(", "));
        let mut q = sqlx::query(&query).bind(&now).bind(&now);
        if let Some(grade) = data.grade {
            q = q.bind(grade);
        }
        if let Some(revision_requested) = data.revision_requested {
            q = q.bind(revision_requested);
        }

        let result = q.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id).await
    }
}
