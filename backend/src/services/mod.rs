//! Application services

pub mod auth;
pub mod github;
pub mod provisioning;

pub use auth::{AccessTokenClaims, AuthConfig, AuthService, LoginResult, RegisterInput};
pub use github::{
    CollaboratorPermission, GithubApiClient, GithubClient, GithubError, NewRepository,
    OAuthApp, TemplateRepository,
};
pub use provisioning::{
    CreateRepositoriesRequest, CreateRepositoriesResult, ProvisioningError,
    RepositoryCreationOutcome, RepositoryCreationStatus, RepositorySpec, create_repositories,
};
