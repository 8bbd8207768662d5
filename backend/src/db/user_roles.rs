//! User roles repository
//!
//! A user role is a user's membership in a course. Course-scoped
//! authorization is resolved here: a user holds a permission in a course when
//! an active membership points at an active role that lists it.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::roles::Permission;
use super::sqlite_helpers::{json_array_contains_sql, new_id, now_iso8601};

const USER_ROLE_COLUMNS: &str = "id, user_id, course_id, role_id, active, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRoleRecord {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub role_id: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUserRole {
    pub user_id: String,
    pub course_id: String,
    pub role_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserRole {
    pub role_id: Option<String>,
    pub active: Option<bool>,
}

pub struct UserRoleRepository {
    pool: SqlitePool,
}

impl UserRoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<UserRoleRecord>> {
        let record = sqlx::query_as::<_, UserRoleRecord>(&format!(
            "SELECT {} FROM user_roles WHERE id = ?",
            USER_ROLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn list_by_course(&self, course_id: &str) -> Result<Vec<UserRoleRecord>> {
        let records = sqlx::query_as::<_, UserRoleRecord>(&format!(
            "SELECT {} FROM user_roles WHERE course_id = ? ORDER BY created_at",
            USER_ROLE_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn list_by_user(&self, user_id: &str) -> Result<Vec<UserRoleRecord>> {
        let records = sqlx::query_as::<_, UserRoleRecord>(&format!(
            "SELECT {} FROM user_roles WHERE user_id = ? ORDER BY created_at",
            USER_ROLE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    pub async fn create(&self, data: CreateUserRole) -> Result<UserRoleRecord> {
        let id = new_id();
        let now = now_iso8601();

        sqlx::query(
            r#"
            INSERT INTO user_roles (id, user_id, course_id, role_id, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.user_id)
        .bind(&data.course_id)
        .bind(&data.role_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user role"))
    }

    pub async fn update(&self, id: &str, data: UpdateUserRole) -> Result<Option<UserRoleRecord>> {
        let mut set_clauses = vec!["updated_at = ?"];
        if data.role_id.is_some() {
            set_clauses.push("role_id = ?");
        }
        if data.active.is_some() {
            set_clauses.push("active = ?");
        }

        let query = format!("UPDATE user_roles SET {} WHERE id = ?", set_clauses.join(", "));
        let mut q = sqlx::query(&query).bind(now_iso8601());
        if let Some(role_id) = data.role_id {
            q = q.bind(role_id);
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

    /// Whether the user holds `permission` in the course through an active role
    pub async fn has_permission(
        &self,
        user_id: &str,
        course_id: &str,
        permission: Permission,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ?
              AND ur.course_id = ?
              AND ur.active = 1
              AND r.active = 1
              AND {}
            "#,
            json_array_contains_sql("r.permissions")
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(permission.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_fixtures::{course, role, user};
    use crate::db::Database;

    #[tokio::test]
    async fn test_permission_requires_active_membership_and_role() {
        let db = Database::in_memory().await.unwrap();
        let course = course(&db).await;
        let ada = user(&db, "ada").await;
        let professor = role(&db, "Profesor", vec![Permission::ViewCourse, Permission::SetReview]).await;

        assert!(
            !db.user_roles()
                .has_permission(&ada.id, &course.id, Permission::ViewCourse)
                .await
                .unwrap()
        );

        let membership = db
            .user_roles()
            .create(CreateUserRole {
                user_id: ada.id.clone(),
                course_id: course.id.clone(),
                role_id: professor.id.clone(),
            })
            .await
            .unwrap();

        let user_roles = db.user_roles();
        assert!(user_roles.has_permission(&ada.id, &course.id, Permission::SetReview).await.unwrap());
        assert!(
            !user_roles
                .has_permission(&ada.id, &course.id, Permission::ManageRepositories)
                .await
                .unwrap()
        );

        user_roles
            .update(
                &membership.id,
                UpdateUserRole {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!user_roles.has_permission(&ada.id, &course.id, Permission::SetReview).await.unwrap());
    }

    #[tokio::test]
    async fn test_one_membership_per_course() {
        let db = Database::in_memory().await.unwrap();
        let course = course(&db).await;
        let ada = user(&db, "ada").await;
        let student = role(&db, "Alumno", vec![Permission::SubmitAssignment]).await;

        let input = CreateUserRole {
            user_id: ada.id.clone(),
            course_id: course.id.clone(),
            role_id: student.id.clone(),
        };
        db.user_roles().create(input.clone()).await.unwrap();
        assert!(db.user_roles().create(input).await.is_err());
    }
}
