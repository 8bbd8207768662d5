//! Database connection and repositories
//!
//! Re-exports are provided for convenience, even if not all are used within the crate.

#![allow(unused_imports)]

pub mod assignments;
pub mod courses;
pub mod groups;
pub mod repositories;
pub mod reviews;
pub mod roles;
pub mod sqlite_helpers;
pub mod subjects;
pub mod submissions;
pub mod user_roles;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use assignments::{AssignmentRecord, AssignmentRepository, CreateAssignment, UpdateAssignment};
pub use courses::{CourseFilter, CourseRecord, CourseRepository, CreateCourse, UpdateCourse};
pub use groups::{CreateGroup, GroupParticipantRecord, GroupRecord, GroupRepository, UpdateGroup};
pub use repositories::{
    CreateRepository, RepositoryRecord, RepositoryRepository, UpdateRepository,
};
pub use reviews::{CreateReview, ReviewRecord, ReviewRepository, UpdateReview};
pub use roles::{CreateRole, Permission, RoleRecord, RoleRepository, UpdateRole};
pub use subjects::{CreateSubject, SubjectRecord, SubjectRepository, UpdateSubject};
pub use submissions::{CreateSubmission, SubmissionRecord, SubmissionRepository, Submitter};
pub use user_roles::{CreateUserRole, UpdateUserRole, UserRoleRecord, UserRoleRepository};
pub use users::{CreateUser, UpdateUser, UserRecord, UsersRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (and create if missing) the SQLite database at `url`
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Fresh migrated in-memory database.
    ///
    /// Every connection to `sqlite::memory:` is its own database, so the pool
    /// is pinned to a single connection.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a subjects repository
    pub fn subjects(&self) -> SubjectRepository {
        SubjectRepository::new(self.pool.clone())
    }

    /// Get a courses repository
    pub fn courses(&self) -> CourseRepository {
        CourseRepository::new(self.pool.clone())
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Get a roles repository
    pub fn roles(&self) -> RoleRepository {
        RoleRepository::new(self.pool.clone())
    }

    /// Get a course membership repository
    pub fn user_roles(&self) -> UserRoleRepository {
        UserRoleRepository::new(self.pool.clone())
    }

    /// Get an assignments repository
    pub fn assignments(&self) -> AssignmentRepository {
        AssignmentRepository::new(self.pool.clone())
    }

    /// Get a groups repository
    pub fn groups(&self) -> GroupRepository {
        GroupRepository::new(self.pool.clone())
    }

    /// Get a submissions repository
    pub fn submissions(&self) -> SubmissionRepository {
        SubmissionRepository::new(self.pool.clone())
    }

    /// Get a reviews repository
    pub fn reviews(&self) -> ReviewRepository {
        ReviewRepository::new(self.pool.clone())
    }

    /// Get a GitHub repositories repository
    pub fn repositories(&self) -> RepositoryRepository {
        RepositoryRepository::new(self.pool.clone())
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Row builders shared by the repository tests
#[cfg(test)]
pub mod test_fixtures {
    use super::*;

    pub async fn course(db: &Database) -> CourseRecord {
        let subject = db
            .subjects()
            .create(CreateSubject {
                code: format!("75.{}", sqlite_helpers::new_id()),
                name: "Algoritmos".to_string(),
            })
            .await
            .unwrap();

        db.courses()
            .create(CreateCourse {
                name: "Curso 2024".to_string(),
                year: 2024,
                period: 1,
                subject_id: subject.id,
                organization: Some("fiuba-algo".to_string()),
            })
            .await
            .unwrap()
    }

    pub async fn user(db: &Database, github_id: &str) -> UserRecord {
        db.users()
            .create(CreateUser {
                name: github_id.to_string(),
                last_name: "Test".to_string(),
                file: None,
                github_id: github_id.to_string(),
                notification_email: None,
                is_admin: false,
            })
            .await
            .unwrap()
    }

    pub async fn role(db: &Database, name: &str, permissions: Vec<Permission>) -> RoleRecord {
        db.roles()
            .create(CreateRole {
                name: name.to_string(),
                permissions,
                parent_role_id: None,
            })
            .await
            .unwrap()
    }

    pub async fn assignment(db: &Database, course_id: &str, is_group: bool) -> AssignmentRecord {
        db.assignments()
            .create(CreateAssignment {
                course_id: course_id.to_string(),
                title: "TP1".to_string(),
                description: None,
                link: None,
                start_date: None,
                end_date: None,
                allow_late_submissions: false,
                is_group,
            })
            .await
            .unwrap()
    }
}
