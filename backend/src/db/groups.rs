//! Groups repository
//!
//! Groups belong to a course; group assignments are submitted on behalf of
//! a group by any of its active participants.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

const GROUP_COLUMNS: &str = "id, course_id, name, active, created_at, updated_at";
const PARTICIPANT_COLUMNS: &str = "id, group_id, user_id, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupParticipantRecord {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub course_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub active: Option<bool>,
}

pub struct GroupRepository {
    pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Groups
    // ========================================================================

    pub async fn get(&self, id: &str) -> Result<Option<GroupRecord>> {
        let record = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {} FROM groups WHERE id = ?",
            GROUP_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_by_course(&self, course_id: &str) -> Result<Vec<GroupRecord>> {
        let records = sqlx::query_as::<_, GroupRecord>(&format!(
            "SELECT {} FROM groups WHERE course_id = ? ORDER BY name",
            GROUP_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// The active group the user participates in within a course, if any
    pub async fn find_for_user_in_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<GroupRecord>> {
        let record = sqlx::query_as::<_, GroupRecord>(
            r#"
            SELECT g.id, g.course_id, g.name, g.active, g.created_at, g.updated_at
            FROM groups g
            JOIN group_participants gp ON gp.group_id = g.id
            WHERE gp.user_id = ?
              AND g.course_id = ?
              AND g.active = 1
              AND gp.active = 1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn create(&self, data: CreateGroup) -> Result<GroupRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO groups (id, course_id, name, active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.course_id)
        .bind(&data.name)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create group"))
    }

    pub async fn update(&self, id: &str, data: UpdateGroup) -> Result<Option<GroupRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.name.is_some() {
            set_clauses.push("name = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!("UPDATE groups SET {} WHERE id = ?", set_clauses.join(", "));
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

    // ========================================================================
    // Participants
    // ========================================================================

    pub async fn list_participants(&self, group_id: &str) -> Result<Vec<GroupParticipantRecord>> {
        let records = sqlx::query_as::<_, GroupParticipantRecord>(&format!(
            "SELECT {} FROM group_participants WHERE group_id = ? AND active = 1 ORDER BY created_at",
            PARTICIPANT_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Add a user to a group, reactivating a previous participation
    pub async fn add_participant(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> Result<GroupParticipantRecord> {
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO group_participants (id, group_id, user_id, active, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?)
            ON CONFLICT (group_id, user_id) DO UPDATE SET
                active = 1,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(new_id())
        .bind(group_id)
        .bind(user_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let record = sqlx::query_as::<_, GroupParticipantRecord>(&format!(
            "SELECT {} FROM group_participants WHERE group_id = ? AND user_id = ?",
            PARTICIPANT_COLUMNS
        ))
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Deactivate a participation; returns false when the user was not in the group
    pub async fn remove_participant(&self, group_id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE group_participants SET active = 0, updated_at = ? WHERE group_id = ? AND user_id = ? AND active = 1",
        )
        .bind(now_iso8601())
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
