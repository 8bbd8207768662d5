//! Repositories repository
//!
//! Rows for GitHub repositories provisioned for a course, plus the users that
//! were granted access to each one.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const REPOSITORY_COLUMNS: &str = "id, course_id, name, github_id, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub github_id: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateRepository {
    pub course_id: String,
    pub name: String,
    pub github_id: i64,
    /// Users linked to the repository on insert
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRepository {
    pub name: Option<String>,
    pub active: Option<bool>,
}

pub struct RepositoryRepository {
    pool: SqlitePool,
}

impl RepositoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<RepositoryRecord>> {
        let record = sqlx::query_as::<_, RepositoryRecord>(&format!(
            "SELECT {} FROM repositories WHERE id = ?",
            REPOSITORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_by_course(&self, course_id: &str) -> Result<Vec<RepositoryRecord>> {
        let records = sqlx::query_as::<_, RepositoryRecord>(&format!(
            "SELECT {} FROM repositories WHERE course_id = ? ORDER BY name",
            REPOSITORY_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Ids of the users linked to a repository
    pub async fn list_user_ids(&self, repository_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT user_id FROM repository_users WHERE repository_id = ? ORDER BY user_id",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Insert a repository and its user links in one transaction
    pub async fn create(&self, data: CreateRepository) -> Result<RepositoryRecord> {
        let id = new_id();
        let now = now_iso8601();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO repositories (id, course_id, name, github_id, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.course_id)
        .bind(&data.name)
        .bind(data.github_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for user_id in &data.user_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO repository_users (repository_id, user_id) VALUES (?, ?)",
            )
            .bind(&id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create repository"))
    }

    pub async fn update(
        &self,
        id: &str,
        data: UpdateRepository,
    ) -> Result<Option<RepositoryRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.name.is_some() {
            set_clauses.push("name = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!(
            "UPDATE repositories SET {} WHERE id = ?",
            set_clauses.join(", ")
        );
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(name) = data.name {
            q = q.bind(name);
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
