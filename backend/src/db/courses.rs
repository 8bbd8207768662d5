//! Courses repository
//!
//! A course is one dictation of a subject in a given year and period. The
//! optional `organization` is the GitHub organization that hosts the
//! course's classroom repositories.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const COURSE_COLUMNS: &str =
    "id, name, year, period, subject_id, organization, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CourseRecord {
    pub id: String,
    pub name: String,
    pub year: i64,
    pub period: i64,
    pub subject_id: String,
    pub organization: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateCourse {
    pub name: String,
    pub year: i64,
    pub period: i64,
    pub subject_id: String,
    pub organization: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub period: Option<i64>,
    pub organization: Option<Option<String>>,
    pub active: Option<bool>,
}

/// Filter for listing courses
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub subject_id: Option<String>,
    pub active: Option<bool>,
    /// Only courses where this user holds an active role
    pub member_user_id: Option<String>,
}

pub struct CourseRepository {
    pool: SqlitePool,
}

impl CourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<CourseRecord>> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {} FROM courses WHERE id = ?",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List courses, newest first
    pub async fn list(&self, filter: &CourseFilter) -> Result<Vec<CourseRecord>> {
        let records = sqlx::query_as::<_, CourseRecord>(&format!(
            r#"
            SELECT {} FROM courses
            WHERE (? IS NULL OR subject_id = ?)
              AND (? IS NULL OR active = ?)
              AND (? IS NULL OR id IN (
                    SELECT course_id FROM user_roles WHERE user_id = ? AND active = 1
              ))
            ORDER BY year DESC, period DESC, name
            "#,
            COURSE_COLUMNS
        ))
        .bind(&filter.subject_id)
        .bind(&filter.subject_id)
        .bind(filter.active)
        .bind(filter.active)
        .bind(&filter.member_user_id)
        .bind(&filter.member_user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn create(&self, data: CreateCourse) -> Result<CourseRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO courses (id, name, year, period, subject_id, organization, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.name)
        .bind(data.year)
        .bind(data.period)
        .bind(&data.subject_id)
        .bind(&data.organization)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create course"))
    }

    pub async fn update(&self, id: &str, data: UpdateCourse) -> Result<Option<CourseRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.name.is_some() {
            set_clauses.push("name = ?");
        }
        if data.year.is_some() {
            set_clauses.push("year = ?");
        }
        if data.period.is_some() {
            set_clauses.push("period = ?");
        }
        if data.organization.is_some() {
            set_clauses.push("organization = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!("UPDATE courses SET {} WHERE id = ?", set_clauses.join(", "));
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(year) = data.year {
            q = q.bind(year);
        }
        if let Some(period) = data.period {
            q = q.bind(period);
        }
        if let Some(organization) = data.organization {
            q = q.bind(organization);
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
