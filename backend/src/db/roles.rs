//! Roles repository
//!
//! A role is a named bundle of course permissions (e.g. "Profesor" with
//! `set_review`, "Alumno" with `submit_assignment`). Permissions are kept as
//! a JSON array of snake_case strings.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};

use super::sqlite_helpers::{new_id, now_iso8601};

/// Capability granted inside a course by a role
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, async_graphql::Enum,
)]
#[serde(rename_all = "snake_case")]
#[graphql(rename_items = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ViewCourse,
    EditCourse,
    ManageUsers,
    ManageAssignments,
    ManageGroups,
    SubmitAssignment,
    ViewAllSubmissions,
    SetReview,
    ManageRepositories,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewCourse => "view_course",
            Permission::EditCourse => "edit_course",
            Permission::ManageUsers => "manage_users",
            Permission::ManageAssignments => "manage_assignments",
            Permission::ManageGroups => "manage_groups",
            Permission::SubmitAssignment => "submit_assignment",
            Permission::ViewAllSubmissions => "view_all_submissions",
            Permission::SetReview => "set_review",
            Permission::ManageRepositories => "manage_repositories",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "view_course" => Ok(Permission::ViewCourse),
            "edit_course" => Ok(Permission::EditCourse),
            "manage_users" => Ok(Permission::ManageUsers),
            "manage_assignments" => Ok(Permission::ManageAssignments),
            "manage_groups" => Ok(Permission::ManageGroups),
            "submit_assignment" => Ok(Permission::SubmitAssignment),
            "view_all_submissions" => Ok(Permission::ViewAllSubmissions),
            "set_review" => Ok(Permission::SetReview),
            "manage_repositories" => Ok(Permission::ManageRepositories),
            _ => Err(anyhow::anyhow!("Unknown permission: {}", s)),
        }
    }
}

const ROLE_COLUMNS: &str = "id, name, permissions, parent_role_id, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct RoleRecord {
    pub id: String,
    pub name: String,
    pub permissions: Json<Vec<Permission>>,
    pub parent_role_id: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateRole {
    pub name: String,
    pub permissions: Vec<Permission>,
    pub parent_role_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub permissions: Option<Vec<Permission>>,
    pub parent_role_id: Option<Option<String>>,
    pub active: Option<bool>,
}

pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<RoleRecord>> {
        let record = sqlx::query_as::<_, RoleRecord>(&format!(
            "SELECT {} FROM roles WHERE id = ?",
            ROLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<RoleRecord>> {
        let records = sqlx::query_as::<_, RoleRecord>(&format!(
            "SELECT {} FROM roles ORDER BY name",
            ROLE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn create(&self, data: CreateRole) -> Result<RoleRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO roles (id, name, permissions, parent_role_id, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.name)
        .bind(Json(&data.permissions))
        .bind(&data.parent_role_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create role"))
    }

    pub async fn update(&self, id: &str, data: UpdateRole) -> Result<Option<RoleRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.name.is_some() {
            set_clauses.push("name = ?");
        }
        if data.permissions.is_some() {
            set_clauses.push("permissions = ?");
        }
        if data.parent_role_id.is_some() {
            set_clauses.push("parent_role_id = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!("UPDATE roles SET {} WHERE id = ?", set_clauses.join(", "));
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(permissions) = data.permissions {
            q = q.bind(Json(permissions));
        }
        if let Some(parent) = data.parent_role_id {
            q = q.bind(parent);
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
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_permission_string_roundtrip() {
        for permission in [
            Permission::ViewCourse,
            Permission::ManageRepositories,
            Permission::ViewAllSubmissions,
        ] {
            assert_eq!(permission.as_str().parse::<Permission>().unwrap(), permission);
        }
        assert!("teleport".parse::<Permission>().is_err());
    }

    #[test]
    fn test_permission_serializes_as_snake_case() {
        let json = serde_json::to_string(&vec![Permission::SetReview]).unwrap();
        assert_eq!(json, r#"["set_review"]"#);
    }

    #[tokio::test]
    async fn test_role_permissions_persist() {
        let db = Database::in_memory().await.unwrap();
        let role = db
            .roles()
            .create(CreateRole {
                name: "Profesor".to_string(),
                permissions: vec![Permission::ViewCourse, Permission::SetReview],
                parent_role_id: None,
            })
            .await
            .unwrap();

        assert_eq!(role.permissions.0, vec![Permission::ViewCourse, Permission::SetReview]);

        let updated = db
            .roles()
            .update(
                &role.id,
                UpdateRole {
                    permissions: Some(vec![Permission::ManageRepositories]),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.permissions.0, vec![Permission::ManageRepositories]);
    }
}
