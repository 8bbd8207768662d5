//! Subjects repository
//!
//! A subject is the catalog entry (e.g. "75.41 Algoritmos y Programación II")
//! that courses are instances of.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const SUBJECT_COLUMNS: &str = "id, code, name, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub id: String,
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateSubject {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSubject {
    pub code: Option<String>,
    pub name: Option<String>,
    pub active: Option<bool>,
}

pub struct SubjectRepository {
    pool: SqlitePool,
}

impl SubjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a subject by ID
    pub async fn get(&self, id: &str) -> Result<Option<SubjectRecord>> {
        let record = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE id = ?",
            SUBJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// List subjects ordered by code, optionally only active/inactive ones
    pub async fn list(&self, active: Option<bool>) -> Result<Vec<SubjectRecord>> {
        let records = sqlx::query_as::<_, SubjectRecord>(&format!(
            "SELECT {} FROM subjects WHERE (? IS NULL OR active = ?) ORDER BY code",
            SUBJECT_COLUMNS
        ))
        .bind(active)
        .bind(active)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn create(&self, data: CreateSubject) -> Result<SubjectRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO subjects (id, code, name, active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.code)
        .bind(&data.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create subject"))
    }

    /// Update a subject, returning None when it does not exist
    pub async fn update(&self, id: &str, data: UpdateSubject) -> Result<Option<SubjectRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.code.is_some() {
            set_clauses.push("code = ?");
        }
        if data.name.is_some() {
            set_clauses.push("name = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!("UPDATE subjects SET {} WHERE id = ?", set_clauses.join(", "));
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(code) = data.code {
            q = q.bind(code);
        }
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

#[cfg(test)]
mod tests {
    use crate::db::{CreateSubject, Database, UpdateSubject};

    #[tokio::test]
    async fn test_create_update_and_filter() {
        let db = Database::in_memory().await.unwrap();
        let subjects = db.subjects();

        let algo = subjects
            .create(CreateSubject {
                code: "75.41".to_string(),
                name: "Algoritmos II".to_string(),
            })
            .await
            .unwrap();
        assert!(algo.active);

        let taller = subjects
            .create(CreateSubject {
                code: "75.42".to_string(),
                name: "Taller".to_string(),
            })
            .await
            .unwrap();

        let updated = subjects
            .update(
                &taller.id,
                UpdateSubject {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.name, "Taller");

        let active = subjects.list(Some(true)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, algo.id);
        assert_eq!(subjects.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let db = Database::in_memory().await.unwrap();
        let input = CreateSubject {
            code: "75.41".to_string(),
            name: "Algoritmos II".to_string(),
        };
        db.subjects().create(input.clone()).await.unwrap();
        assert!(db.subjects().create(input).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_subject() {
        let db = Database::in_memory().await.unwrap();
        let result = db
            .subjects()
            .update("missing", UpdateSubject::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
