pub mod assignments;
pub mod auth;
pub mod courses;
pub mod groups;
pub mod repositories;
pub mod roles;
pub mod subjects;
pub mod submissions;
pub mod users;

pub use assignments::AssignmentMutations;
pub use auth::AuthMutations;
pub use courses::CourseMutations;
pub use groups::GroupMutations;
pub use repositories::RepositoryMutations;
pub use roles::RoleMutations;
pub use subjects::SubjectMutations;
pub use submissions::SubmissionMutations;
pub use users::UserMutations;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::{
        AdminGuard, AuthExt, AuthGuard, AuthUser, require_course_permission,
        require_self_or_admin,
    };
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::GithubClient;
}
