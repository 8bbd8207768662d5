//! GraphQL types
//!
//! Output objects mirror the database records; timestamps are RFC 3339
//! strings. Create/update mutations return payloads declared with
//! `mutation_result!`.

use async_graphql::{Enum, InputObject, MaybeUndefined, SimpleObject};
use teachhub_macros::mutation_result;

use crate::db::{
    AssignmentRecord, CourseRecord, GroupParticipantRecord, GroupRecord, Permission,
    RepositoryRecord, ReviewRecord, RoleRecord, SubjectRecord, SubmissionRecord, UserRecord,
    UserRoleRecord,
};
use crate::services::{RepositoryCreationOutcome, RepositoryCreationStatus};

// ============================================================================
// Subjects and courses
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
pub struct Subject {
    pub id: String,
    /// Department code, e.g. "75.41"
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SubjectRecord> for Subject {
    fn from(r: SubjectRecord) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateSubjectInput {
    pub code: String,
    pub name: String,
}

#[derive(Debug, InputObject)]
pub struct UpdateSubjectInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub active: Option<bool>,
}

mutation_result!(SubjectResult, subject: Subject);

#[derive(Debug, Clone, SimpleObject)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub year: i32,
    /// Semester or term within the year
    pub period: i32,
    pub subject_id: String,
    /// GitHub organization where course repositories live
    pub organization: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CourseRecord> for Course {
    fn from(r: CourseRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            year: r.year as i32,
            period: r.period as i32,
            subject_id: r.subject_id,
            organization: r.organization,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateCourseInput {
    pub name: String,
    pub year: i32,
    pub period: i32,
    pub subject_id: String,
    pub organization: Option<String>,
}

#[derive(Debug, InputObject)]
pub struct UpdateCourseInput {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub period: Option<i32>,
    pub organization: MaybeUndefined<String>,
    pub active: Option<bool>,
}

mutation_result!(CourseResult, course: Course);

// ============================================================================
// Users, roles and memberships
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
pub struct User {
    pub id: String,
    pub name: String,
    pub last_name: String,
    /// University file (student number)
    pub file: Option<String>,
    /// GitHub login
    pub github_id: String,
    pub notification_email: Option<String>,
    pub is_admin: bool,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            last_name: r.last_name,
            file: r.file,
            github_id: r.github_id,
            notification_email: r.notification_email,
            is_admin: r.is_admin,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateUserInput {
    pub name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub github_id: String,
    pub notification_email: Option<String>,
    #[graphql(default)]
    pub is_admin: bool,
}

#[derive(Debug, InputObject)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub file: MaybeUndefined<String>,
    pub notification_email: MaybeUndefined<String>,
    /// Administrators only
    pub is_admin: Option<bool>,
    /// Administrators only
    pub active: Option<bool>,
}

/// Profile submitted together with the OAuth code on sign up
#[derive(Debug, InputObject)]
pub struct RegisterUserInput {
    pub name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub notification_email: Option<String>,
}

mutation_result!(UserResult, user: User);

#[derive(Debug, Clone, SimpleObject)]
pub struct AuthSession {
    /// Bearer token for the `Authorization` header
    pub token: String,
    pub user: User,
}

mutation_result!(
    /// Result of login or register
    AuthResult, session: AuthSession
);

#[derive(Debug, Clone, SimpleObject)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub permissions: Vec<Permission>,
    pub parent_role_id: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<RoleRecord> for Role {
    fn from(r: RoleRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            permissions: r.permissions.0,
            parent_role_id: r.parent_role_id,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateRoleInput {
    pub name: String,
    pub permissions: Vec<Permission>,
    pub parent_role_id: Option<String>,
}

#[derive(Debug, InputObject)]
pub struct UpdateRoleInput {
    pub name: Option<String>,
    pub permissions: Option<Vec<Permission>>,
    pub parent_role_id: MaybeUndefined<String>,
    pub active: Option<bool>,
}

mutation_result!(RoleResult, role: Role);

/// A user's membership in a course
#[derive(Debug, Clone, SimpleObject)]
pub struct UserRole {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub role_id: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserRoleRecord> for UserRole {
    fn from(r: UserRoleRecord) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            course_id: r.course_id,
            role_id: r.role_id,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateUserRoleInput {
    pub user_id: String,
    pub course_id: String,
    pub role_id: String,
}

#[derive(Debug, InputObject)]
pub struct UpdateUserRoleInput {
    pub role_id: Option<String>,
    pub active: Option<bool>,
}

mutation_result!(UserRoleResult, user_role: UserRole);

// ============================================================================
// Assignments, groups, submissions and reviews
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
pub struct Assignment {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Statement or instructions URL
    pub link: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub allow_late_submissions: bool,
    /// Submitted by groups instead of individual students
    pub is_group: bool,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AssignmentRecord> for Assignment {
    fn from(r: AssignmentRecord) -> Self {
        Self {
            id: r.id,
            course_id: r.course_id,
            title: r.title,
            description: r.description,
            link: r.link,
            start_date: r.start_date,
            end_date: r.end_date,
            allow_late_submissions: r.allow_late_submissions,
            is_group: r.is_group,
            active: r.active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateAssignmentInput {
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[graphql(default)]
    pub allow_late_submissions: bool,
    #[graphql(default)]
    pub is_group: bool,
}

#[derive(Debug, InputObject)]
pub struct UpdateAssignmentInput {
    pub title: Option<String>,
    pub description: MaybeUndefined<String>,
    pub link: MaybeUndefined<String>,
    pub start_date: MaybeUndefined<String>,
    pub end_date: MaybeUndefined<String>,
    pub allow_late_submissions: Option<bool>,
    pub is_group: Option<bool>,
    pub active: Option<bool>,
}

mutation_result!(AssignmentResult, assignment: Assignment);

#[derive(Debug, Clone, SimpleObject)]
pub struct GroupParticipant {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub active: bool,
    pub created_at: String,
}

impl From<GroupParticipantRecord> for GroupParticipant {
    fn from(r: GroupParticipantRecord) -> Self {
        Self {
            id: r.id,
            group_id: r.group_id,
            user_id: r.user_id,
            active: r.active,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct Group {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub active: bool,
    /// Active participants
    pub participants: Vec<GroupParticipant>,
    pub created_at: String,
    pub updated_at: String,
}

impl Group {
    pub fn new(record: GroupRecord, participants: Vec<GroupParticipantRecord>) -> Self {
        Self {
            id: record.id,
            course_id: record.course_id,
            name: record.name,
            active: record.active,
            participants: participants.into_iter().map(GroupParticipant::from).collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateGroupInput {
    pub course_id: String,
    pub name: String,
    /// Initial participants
    #[graphql(default)]
    pub user_ids: Vec<String>,
}

#[derive(Debug, InputObject)]
pub struct UpdateGroupInput {
    pub name: Option<String>,
    pub active: Option<bool>,
}

mutation_result!(GroupResult, group: Group);

#[derive(Debug, Clone, SimpleObject)]
pub struct Submission {
    pub id: String,
    pub assignment_id: String,
    pub submitter_user_id: Option<String>,
    pub submitter_group_id: Option<String>,
    pub description: Option<String>,
    pub pull_request_url: String,
    pub submitted_at: String,
    pub submitted_again_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SubmissionRecord> for Submission {
    fn from(r: SubmissionRecord) -> Self {
        Self {
            id: r.id,
            assignment_id: r.assignment_id,
            submitter_user_id: r.submitter_user_id,
            submitter_group_id: r.submitter_group_id,
            description: r.description,
            pull_request_url: r.pull_request_url,
            submitted_at: r.submitted_at,
            submitted_again_at: r.submitted_again_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateSubmissionInput {
    pub assignment_id: String,
    pub description: Option<String>,
    pub pull_request_url: String,
}

mutation_result!(SubmissionResult, submission: Submission);

#[derive(Debug, Clone, SimpleObject)]
pub struct Review {
    pub id: String,
    pub submission_id: String,
    pub reviewer_user_id: String,
    /// 1 to 10
    pub grade: Option<i32>,
    pub revision_requested: bool,
    pub reviewed_at: String,
    pub reviewed_again_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ReviewRecord> for Review {
    fn from(r: ReviewRecord) -> Self {
        Self {
            id: r.id,
            submission_id: r.submission_id,
            reviewer_user_id: r.reviewer_user_id,
            grade: r.grade.map(|g| g as i32),
            revision_requested: r.revision_requested,
            reviewed_at: r.reviewed_at,
            reviewed_again_at: r.reviewed_again_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct CreateReviewInput {
    pub submission_id: String,
    pub grade: Option<i32>,
    #[graphql(default)]
    pub revision_requested: bool,
}

#[derive(Debug, InputObject)]
pub struct UpdateReviewInput {
    pub grade: MaybeUndefined<i32>,
    pub revision_requested: Option<bool>,
}

mutation_result!(ReviewResult, review: Review);

// ============================================================================
// Repositories
// ============================================================================

#[derive(Debug, Clone, SimpleObject)]
pub struct Repository {
    pub id: String,
    pub course_id: String,
    pub name: String,
    /// GitHub repository id
    pub github_id: i64,
    pub active: bool,
    /// Students with access
    pub user_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Repository {
    pub fn new(record: RepositoryRecord, user_ids: Vec<String>) -> Self {
        Self {
            id: record.id,
            course_id: record.course_id,
            name: record.name,
            github_id: record.github_id,
            active: record.active,
            user_ids,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, InputObject)]
pub struct UpdateRepositoryInput {
    pub name: Option<String>,
    pub active: Option<bool>,
}

mutation_result!(RepositoryResult, repository: Repository);

#[derive(Debug, InputObject)]
pub struct RepositoryRequestInput {
    pub name: String,
    /// Users granted Write access
    pub student_ids: Vec<String>,
    #[graphql(default = true)]
    pub is_private: bool,
}

#[derive(Debug, InputObject)]
pub struct TemplateInput {
    /// Template repository in the same organization
    pub name: String,
    #[graphql(default)]
    pub include_all_branches: bool,
}

#[derive(Debug, InputObject)]
pub struct CreateRepositoriesInput {
    pub course_id: String,
    /// Defaults to the course organization
    pub organization: Option<String>,
    /// Users added to every repository as admins
    #[graphql(default)]
    pub admin_ids: Vec<String>,
    /// Users added to every repository as maintainers
    #[graphql(default)]
    pub maintainer_ids: Vec<String>,
    pub repositories: Vec<RepositoryRequestInput>,
    pub template: Option<TemplateInput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum RepositoryStatus {
    Created,
    FailedOnCreate,
    CreatedFailedAddingCollaborator,
}

impl From<RepositoryCreationStatus> for RepositoryStatus {
    fn from(status: RepositoryCreationStatus) -> Self {
        match status {
            RepositoryCreationStatus::Created => RepositoryStatus::Created,
            RepositoryCreationStatus::FailedOnCreate => RepositoryStatus::FailedOnCreate,
            RepositoryCreationStatus::CreatedFailedAddingCollaborator => {
                RepositoryStatus::CreatedFailedAddingCollaborator
            }
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct RepositoryOutcome {
    pub name: String,
    pub status: RepositoryStatus,
    /// GitHub repository id when the repository was created
    pub remote_id: Option<i64>,
    pub failed_collaborator_usernames: Vec<String>,
}

impl From<RepositoryCreationOutcome> for RepositoryOutcome {
    fn from(o: RepositoryCreationOutcome) -> Self {
        Self {
            name: o.name,
            status: o.status.into(),
            remote_id: o.remote_id,
            failed_collaborator_usernames: o.failed_collaborator_usernames,
        }
    }
}

/// Result of bulk repository provisioning
#[derive(Debug, Clone, SimpleObject)]
pub struct CreateRepositoriesPayload {
    /// False when any repository failed or could not be recorded
    pub success: bool,
    pub error: Option<String>,
    pub successful: Vec<RepositoryOutcome>,
    pub partially_failed: Vec<RepositoryOutcome>,
    pub failed: Vec<RepositoryOutcome>,
    /// Rows recorded for the repositories that exist on GitHub
    pub repositories: Vec<Repository>,
}
