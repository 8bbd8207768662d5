//! GitHub integration
//!
//! [`GithubClient`] is the seam between the provisioning workflow / login
//! flow and the GitHub REST API. [`GithubApiClient`] is the HTTP
//! implementation; tests substitute their own.

mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{GithubApiClient, OAuthApp};

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed GitHub response: {0}")]
    MalformedResponse(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Repository to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub private: bool,
}

/// Template to clone new repositories from. The template is looked up in
/// the same organization the repositories are created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRepository {
    pub name: String,
    pub include_all_branches: bool,
}

/// The fields of a creation response the application relies on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepository {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Permission granted to a repository collaborator, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollaboratorPermission {
    Write,
    Maintain,
    Admin,
}

impl CollaboratorPermission {
    /// Value of the `permission` field on the collaborators endpoint
    pub fn as_github_str(&self) -> &'static str {
        match self {
            CollaboratorPermission::Admin => "admin",
            CollaboratorPermission::Maintain => "maintain",
            CollaboratorPermission::Write => "push",
        }
    }
}

impl std::fmt::Display for CollaboratorPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_github_str())
    }
}

#[async_trait]
pub trait GithubClient: Send + Sync {
    /// `POST /orgs/{org}/repos`
    async fn create_repository(
        &self,
        organization: &str,
        repository: &NewRepository,
    ) -> Result<CreatedRepository, GithubError>;

    /// `POST /repos/{org}/{template}/generate`, owned by the same organization
    async fn create_repository_from_template(
        &self,
        organization: &str,
        template: &TemplateRepository,
        repository: &NewRepository,
    ) -> Result<CreatedRepository, GithubError>;

    /// `PUT /repos/{owner}/{repo}/collaborators/{username}`
    async fn add_collaborator(
        &self,
        owner: &str,
        repository: &str,
        username: &str,
        permission: CollaboratorPermission,
    ) -> Result<(), GithubError>;

    /// `GET /user` with a user access token
    async fn authenticated_user(&self, access_token: &str) -> Result<GithubUser, GithubError>;

    /// Trade an OAuth callback code for a user access token
    async fn exchange_oauth_code(&self, code: &str) -> Result<String, GithubError>;

    /// Browser URL that starts the OAuth flow
    fn authorize_url(&self, state: &str) -> Result<String, GithubError>;
}
