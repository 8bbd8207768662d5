//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use teachhub::services::github::{CreatedRepository, GithubUser};
use teachhub::services::{
    CollaboratorPermission, GithubClient, GithubError, NewRepository, TemplateRepository,
};

/// A GitHub call recorded by [`FakeGithub`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create {
        organization: String,
        name: String,
        private: bool,
    },
    CreateFromTemplate {
        organization: String,
        template: String,
        include_all_branches: bool,
        name: String,
    },
    AddCollaborator {
        owner: String,
        repository: String,
        username: String,
        permission: CollaboratorPermission,
    },
}

/// In-memory GitHub that records every call.
///
/// OAuth codes are accepted as-is and map to the login of the same name.
#[derive(Default)]
pub struct FakeGithub {
    failing_repositories: HashSet<String>,
    malformed_repositories: HashSet<String>,
    failing_collaborators: HashSet<(String, String)>,
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
}

impl FakeGithub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creating `name` fails with a 422
    pub fn fail_create(mut self, name: &str) -> Self {
        self.failing_repositories.insert(name.to_string());
        self
    }

    /// Creating `name` answers 201 with a body lacking `id`
    pub fn malformed_create(mut self, name: &str) -> Self {
        self.malformed_repositories.insert(name.to_string());
        self
    }

    /// Adding `username` to `repository` fails with a 404
    pub fn fail_collaborator(mut self, repository: &str, username: &str) -> Self {
        self.failing_collaborators
            .insert((repository.to_string(), username.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Collaborator adds issued for `repository`, as (username, permission)
    pub fn collaborators_of(&self, repository: &str) -> Vec<(String, CollaboratorPermission)> {
        let mut added: Vec<_> = self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddCollaborator {
                    repository: r,
                    username,
                    permission,
                    ..
                } if r == repository => Some((username, permission)),
                _ => None,
            })
            .collect();
        added.sort();
        added
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn created(&self, name: &str) -> Result<CreatedRepository, GithubError> {
        if self.failing_repositories.contains(name) {
            return Err(GithubError::Api {
                status: 422,
                message: "name already exists on this account".to_string(),
            });
        }
        if self.malformed_repositories.contains(name) {
            return Err(GithubError::MalformedResponse(
                "creation response missing fields (id: None, name: Some(..))".to_string(),
            ));
        }
        Ok(CreatedRepository {
            id: 1000 + self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
        })
    }
}

#[async_trait]
impl GithubClient for FakeGithub {
    async fn create_repository(
        &self,
        organization: &str,
        repository: &NewRepository,
    ) -> Result<CreatedRepository, GithubError> {
        self.record(Call::Create {
            organization: organization.to_string(),
            name: repository.name.clone(),
            private: repository.private,
        });
        tokio::task::yield_now().await;
        self.created(&repository.name)
    }

    async fn create_repository_from_template(
        &self,
        organization: &str,
        template: &TemplateRepository,
        repository: &NewRepository,
    ) -> Result<CreatedRepository, GithubError> {
        self.record(Call::CreateFromTemplate {
            organization: organization.to_string(),
            template: template.name.clone(),
            include_all_branches: template.include_all_branches,
            name: repository.name.clone(),
        });
        tokio::task::yield_now().await;
        self.created(&repository.name)
    }

    async fn add_collaborator(
        &self,
        owner: &str,
        repository: &str,
        username: &str,
        permission: CollaboratorPermission,
    ) -> Result<(), GithubError> {
        self.record(Call::AddCollaborator {
            owner: owner.to_string(),
            repository: repository.to_string(),
            username: username.to_string(),
            permission,
        });
        tokio::task::yield_now().await;

        if self
            .failing_collaborators
            .contains(&(repository.to_string(), username.to_string()))
        {
            return Err(GithubError::Api {
                status: 404,
                message: "Not Found".to_string(),
            });
        }
        Ok(())
    }

    async fn authenticated_user(&self, access_token: &str) -> Result<GithubUser, GithubError> {
        let login = access_token
            .strip_prefix("token-")
            .ok_or_else(|| GithubError::Api {
                status: 401,
                message: "Bad credentials".to_string(),
            })?;
        Ok(GithubUser {
            id: 1,
            login: login.to_string(),
            name: None,
            email: None,
        })
    }

    async fn exchange_oauth_code(&self, code: &str) -> Result<String, GithubError> {
        if code.is_empty() {
            return Err(GithubError::Api {
                status: 400,
                message: "bad_verification_code".to_string(),
            });
        }
        Ok(format!("token-{}", code))
    }

    fn authorize_url(&self, state: &str) -> Result<String, GithubError> {
        Ok(format!("https://github.test/login/oauth/authorize?state={}", state))
    }
}
