//! Assignments repository

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const ASSIGNMENT_COLUMNS: &str = "id, course_id, title, description, link, start_date, end_date, allow_late_submissions, is_group, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub allow_late_submissions: bool,
    pub is_group: bool,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateAssignment {
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub allow_late_submissions: bool,
    pub is_group: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAssignment {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub link: Option<Option<String>>,
    pub start_date: Option<Option<String>>,
    pub end_date: Option<Option<String>>,
    pub allow_late_submissions: Option<bool>,
    pub is_group: Option<bool>,
    pub active: Option<bool>,
}

pub struct AssignmentRepository {
    pool: SqlitePool,
}

impl AssignmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<AssignmentRecord>> {
        let record = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {} FROM assignments WHERE id = ?",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Assignments of a course ordered by start date (undated ones last)
    pub async fn list_by_course(&self, course_id: &str) -> Result<Vec<AssignmentRecord>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(&format!(
            r#"
            SELECT {} FROM assignments
            WHERE course_id = ?
            ORDER BY start_date IS NULL, start_date, title
            "#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn create(&self, data: CreateAssignment) -> Result<AssignmentRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO assignments (
                id, course_id, title, description, link, start_date, end_date,
                allow_late_submissions, is_group, active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.link)
        .bind(&data.start_date)
        .bind(&data.end_date)
        .bind(data.allow_late_submissions)
        .bind(data.is_group)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create assignment"))
    }

    pub async fn update(
        &self,
        id: &str,
        data: UpdateAssignment,
    ) -> Result<Option<AssignmentRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.title.is_some() {
            set_clauses.push("title = ?");
        }
        if data.description.is_some() {
            set_clauses.push("description = ?");
        }
        if data.link.is_some() {
            set_clauses.push("link = ?");
        }
        if data.start_date.is_some() {
            set_clauses.push("start_date = ?");
        }
        if data.end_date.is_some() {
            set_clauses.push("end_date = ?");
        }
        if data.allow_late_submissions.is_some() {
            set_clauses.push("allow_late_submissions = ?");
        }
        if data.is_group.is_some() {
            set_clauses.push("is_group = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!(
            "UPDATE assignments SET {} WHERE id = ?",
            set_clauses.join(", ")
        );
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(link) = data.link {
            q = q.bind(link);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }
        if let Some(allow_late) = data.allow_late_submissions {
            q = q.bind(allow_late);
        }
        if let Some(is_group) = data.is_group {
            q = q.bind(is_group);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        let result = q.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(id).await
    }
}
