//! GraphQL schema assembly
//!
//! Each domain contributes a `*Queries`/`*Mutations` object; they are merged
//! into the roots here. Operations require authentication unless noted on
//! the resolver.

use std::sync::Arc;

use async_graphql::{EmptySubscription, MergedObject, Schema};

use crate::db::Database;
use crate::services::{AuthService, GithubClient};

use super::mutations::{
    AssignmentMutations, AuthMutations, CourseMutations, GroupMutations, RepositoryMutations,
    RoleMutations, SubjectMutations, SubmissionMutations, UserMutations,
};
use super::queries::{
    AssignmentQueries, CourseQueries, GroupQueries, RepositoryQueries, RoleQueries,
    SubjectQueries, SubmissionQueries, UserQueries,
};

#[derive(MergedObject, Default)]
pub struct QueryRoot(
    UserQueries,
    SubjectQueries,
    CourseQueries,
    RoleQueries,
    AssignmentQueries,
    GroupQueries,
    SubmissionQueries,
    RepositoryQueries,
);

#[derive(MergedObject, Default)]
pub struct MutationRoot(
    AuthMutations,
    UserMutations,
    SubjectMutations,
    CourseMutations,
    RoleMutations,
    AssignmentMutations,
    GroupMutations,
    SubmissionMutations,
    RepositoryMutations,
);

/// The GraphQL schema type
pub type TeachHubSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema. The per-request `AuthUser` is attached by the HTTP handler.
pub fn build_schema(
    db: Database,
    github: Arc<dyn GithubClient>,
    auth: AuthService,
) -> TeachHubSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .data(db)
        .data(github)
        .data(auth)
        .finish()
}
