//! Users repository
//!
//! Users authenticate through GitHub; `github_id` holds the GitHub login and
//! is the username used when granting repository access.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601, placeholders};

const USER_COLUMNS: &str = "id, name, last_name, file, github_id, notification_email, is_admin, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub github_id: String,
    pub notification_email: Option<String>,
    pub is_admin: bool,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub github_id: String,
    pub notification_email: Option<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub file: Option<Option<String>>,
    pub notification_email: Option<Option<String>>,
    pub is_admin: Option<bool>,
    pub active: Option<bool>,
}

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Get user by GitHub login (case-insensitive)
    pub async fn get_by_github_id(&self, github_id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE github_id = ? COLLATE NOCASE",
            USER_COLUMNS
        ))
        .bind(github_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users ORDER BY last_name, name",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Users holding an active role in a course
    pub async fn list_by_course(&self, course_id: &str) -> Result<Vec<UserRecord>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            SELECT {} FROM users
            WHERE id IN (SELECT user_id FROM user_roles WHERE course_id = ? AND active = 1)
            ORDER BY last_name, name
            "#,
            USER_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Map user ids to GitHub logins. Ids that do not exist or belong to a
    /// deactivated user are absent from the map.
    pub async fn github_ids_by_user_ids(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = format!(
            "SELECT id, github_id FROM users WHERE active = 1 AND id IN ({})",
            placeholders(ids.len())
        );
        let mut q = sqlx::query_as::<_, (String, String)>(&query);
        for id in ids {
            q = q.bind(id);
        }

        Ok(q.fetch_all(&self.pool).await?.into_iter().collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, last_name, file, github_id, notification_email, is_admin, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&user.name)
        .bind(&user.last_name)
        .bind(&user.file)
        .bind(&user.github_id)
        .bind(&user.notification_email)
        .bind(user.is_admin)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    pub async fn update(&self, id: &str, update: UpdateUser) -> Result<Option<UserRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if update.name.is_some() {
            set_clauses.push("name = ?");
        }
        if update.last_name.is_some() {
            set_clauses.push("last_name = ?");
        }
        if update.file.is_some() {
            set_clauses.push("file = ?");
        }
        if update.notification_email.is_some() {
            set_clauses.push("notification_email = ?");
        }
        if update.is_admin.is_some() {
            set_clauses.push("is_admin = ?");
        }
        if update.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!("UPDATE users SET {} WHERE id = ?", set_clauses.join(", "));
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(name) = update.name {
            q = q.bind(name);
        }
        if let Some(last_name) = update.last_name {
            q = q.bind(last_name);
        }
        if let Some(file) = update.file {
            q = q.bind(file);
        }
        if let Some(email) = update.notification_email {
            q = q.bind(email);
        }
        if let Some(is_admin) = update.is_admin {
            q = q.bind(is_admin);
        }
        if let Some(active) = update.active {
            q = q.bind(active);
        }

        let result = q.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::db::{CreateUser, Database, UpdateUser};

    fn student(github_id: &str) -> CreateUser {
        CreateUser {
            name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            file: Some("100000".to_string()),
            github_id: github_id.to_string(),
            notification_email: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_github_lookup_is_case_insensitive() {
        let db = Database::in_memory().await.unwrap();
        let created = db.users().create(student("AdaL")).await.unwrap();

        let found = db.users().get_by_github_id("adal").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(db.users().create(student("adal")).await.is_err());
    }

    #[tokio::test]
    async fn test_github_ids_by_user_ids_skips_unknown() {
        let db = Database::in_memory().await.unwrap();
        let ada = db.users().create(student("ada")).await.unwrap();
        let alan = db.users().create(student("alan")).await.unwrap();

        let ids = vec![ada.id.clone(), alan.id.clone(), "unknown".to_string()];
        let logins = db.users().github_ids_by_user_ids(&ids).await.unwrap();

        assert_eq!(logins.len(), 2);
        assert_eq!(logins.get(&ada.id).map(String::as_str), Some("ada"));
        assert_eq!(logins.get(&alan.id).map(String::as_str), Some("alan"));
        assert!(db.users().github_ids_by_user_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_github_ids_by_user_ids_skips_inactive() {
        let db = Database::in_memory().await.unwrap();
        let ada = db.users().create(student("ada")).await.unwrap();
        let alan = db.users().create(student("alan")).await.unwrap();
        db.users()
            .update(
                &alan.id,
                UpdateUser {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let logins = db
            .users()
            .github_ids_by_user_ids(&[ada.id.clone(), alan.id.clone()])
            .await
            .unwrap();

        assert_eq!(logins.len(), 1);
        assert!(logins.contains_key(&ada.id));
    }
}
