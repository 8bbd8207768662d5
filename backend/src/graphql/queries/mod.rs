pub mod assignments;
pub mod courses;
pub mod groups;
pub mod repositories;
pub mod roles;
pub mod subjects;
pub mod submissions;
pub mod users;

pub use assignments::AssignmentQueries;
pub use courses::CourseQueries;
pub use groups::GroupQueries;
pub use repositories::RepositoryQueries;
pub use roles::RoleQueries;
pub use subjects::SubjectQueries;
pub use submissions::SubmissionQueries;
pub use users::UserQueries;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::auth::{
        AuthExt, AuthGuard, has_course_permission, require_course_permission,
    };
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::GithubClient;
}
