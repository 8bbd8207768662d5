//! Classroom repository provisioning
//!
//! Creates a batch of repositories in a GitHub organization and grants every
//! collaborator access, best effort: a failed repository or collaborator is
//! recorded in the result and never stops the rest of the batch.
//!
//! All repositories are driven concurrently from the calling task. A
//! repository's collaborator requests start once its own creation has
//! succeeded and run concurrently with each other. Outcomes are built from
//! per-repository state and merged only after every future settles.

use std::collections::{BTreeMap, BTreeSet};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::github::{
    CollaboratorPermission, CreatedRepository, GithubClient, NewRepository, TemplateRepository,
};

/// One repository to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub name: String,
    /// GitHub logins granted Write access
    pub collaborator_usernames: BTreeSet<String>,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorAssignment {
    pub username: String,
    pub permission: CollaboratorPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepositoryCreationStatus {
    Created,
    FailedOnCreate,
    CreatedFailedAddingCollaborator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCreationOutcome {
    pub name: String,
    pub status: RepositoryCreationStatus,
    /// GitHub repository id, absent when creation failed
    pub remote_id: Option<i64>,
    pub failed_collaborator_usernames: Vec<String>,
}

/// Every requested repository lands in exactly one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateRepositoriesResult {
    pub successful: Vec<RepositoryCreationOutcome>,
    pub partially_failed: Vec<RepositoryCreationOutcome>,
    pub failed: Vec<RepositoryCreationOutcome>,
}

impl CreateRepositoriesResult {
    pub fn len(&self) -> usize {
        self.successful.len() + self.partially_failed.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Outcomes whose repository exists on GitHub
    pub fn created(&self) -> impl Iterator<Item = &RepositoryCreationOutcome> {
        self.successful.iter().chain(self.partially_failed.iter())
    }

    fn push(&mut self, outcome: RepositoryCreationOutcome) {
        match outcome.status {
            RepositoryCreationStatus::Created => self.successful.push(outcome),
            RepositoryCreationStatus::CreatedFailedAddingCollaborator => {
                self.partially_failed.push(outcome)
            }
            RepositoryCreationStatus::FailedOnCreate => self.failed.push(outcome),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateRepositoriesRequest {
    pub organization: String,
    pub repositories: Vec<RepositorySpec>,
    /// Added to every repository with Admin permission
    pub admins: Vec<String>,
    /// Added to every repository with Maintain permission
    pub maintainers: Vec<String>,
    pub template: Option<TemplateRepository>,
}

/// Invalid input; raised before any request is sent
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisioningError {
    #[error("organization is required")]
    MissingOrganization,

    #[error("repository at position {0} has an empty name")]
    EmptyRepositoryName(usize),
}

/// Full collaborator set for one repository.
///
/// A login listed more than once keeps its highest permission.
pub fn collaborator_assignments(
    admins: &[String],
    maintainers: &[String],
    spec: &RepositorySpec,
) -> Vec<CollaboratorAssignment> {
    let mut by_username: BTreeMap<&str, CollaboratorPermission> = BTreeMap::new();

    let levels = [
        (admins.iter().collect::<Vec<_>>(), CollaboratorPermission::Admin),
        (maintainers.iter().collect(), CollaboratorPermission::Maintain),
        (spec.collaborator_usernames.iter().collect(), CollaboratorPermission::Write),
    ];

    for (usernames, permission) in levels {
        for username in usernames {
            let entry = by_username.entry(username.as_str()).or_insert(permission);
            *entry = (*entry).max(permission);
        }
    }

    by_username
        .into_iter()
        .map(|(username, permission)| CollaboratorAssignment {
            username: username.to_string(),
            permission,
        })
        .collect()
}

/// Create every requested repository and add its collaborators.
///
/// Only invalid input is an error; GitHub failures are reported per
/// repository in the returned buckets.
pub async fn create_repositories(
    client: &dyn GithubClient,
    request: &CreateRepositoriesRequest,
) -> Result<CreateRepositoriesResult, ProvisioningError> {
    let organization = request.organization.trim();
    if organization.is_empty() {
        return Err(ProvisioningError::MissingOrganization);
    }
    if let Some(index) = request
        .repositories
        .iter()
        .position(|spec| spec.name.trim().is_empty())
    {
        return Err(ProvisioningError::EmptyRepositoryName(index));
    }

    info!(
        organization,
        repositories = request.repositories.len(),
        template = request.template.as_ref().map(|t| t.name.as_str()),
        "Provisioning repositories"
    );

    let outcomes = join_all(
        request
            .repositories
            .iter()
            .map(|spec| provision_one(client, organization, request, spec)),
    )
    .await;

    let mut result = CreateRepositoriesResult::default();
    for outcome in outcomes {
        result.push(outcome);
    }

    info!(
        organization,
        successful = result.successful.len(),
        partially_failed = result.partially_failed.len(),
        failed = result.failed.len(),
        "Repository provisioning finished"
    );

    Ok(result)
}

async fn provision_one(
    client: &dyn GithubClient,
    organization: &str,
    request: &CreateRepositoriesRequest,
    spec: &RepositorySpec,
) -> RepositoryCreationOutcome {
    let new_repository = NewRepository {
        name: spec.name.clone(),
        private: spec.is_private,
    };

    let created = match &request.template {
        Some(template) => {
            client
                .create_repository_from_template(organization, template, &new_repository)
                .await
        }
        None => client.create_repository(organization, &new_repository).await,
    };

    let CreatedRepository { id, name } = match created {
        Ok(created) => created,
        Err(e) => {
            error!(
                organization,
                repository = %spec.name,
                error = %e,
                "Failed to create repository"
            );
            return RepositoryCreationOutcome {
                name: spec.name.clone(),
                status: RepositoryCreationStatus::FailedOnCreate,
                remote_id: None,
                failed_collaborator_usernames: Vec::new(),
            };
        }
    };

    debug!(organization, repository = %name, remote_id = id, "Repository created");

    let repository = name.as_str();
    let assignments = collaborator_assignments(&request.admins, &request.maintainers, spec);
    let results = join_all(assignments.iter().map(|assignment| async move {
        client
            .add_collaborator(organization, repository, &assignment.username, assignment.permission)
            .await
            .map_err(|e| {
                warn!(
                    organization,
                    repository,
                    username = %assignment.username,
                    permission = %assignment.permission,
                    error = %e,
                    "Failed to add collaborator"
                );
                assignment.username.clone()
            })
    }))
    .await;

    let failed_collaborator_usernames: Vec<String> =
        results.into_iter().filter_map(Result::err).collect();

    let status = if failed_collaborator_usernames.is_empty() {
        RepositoryCreationStatus::Created
    } else {
        RepositoryCreationStatus::CreatedFailedAddingCollaborator
    };

    RepositoryCreationOutcome {
        name: spec.name.clone(),
        status,
        remote_id: Some(id),
        failed_collaborator_usernames,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, collaborators: &[&str]) -> RepositorySpec {
        RepositorySpec {
            name: name.to_string(),
            collaborator_usernames: collaborators.iter().map(|c| c.to_string()).collect(),
            is_private: true,
        }
    }

    #[test]
    fn test_assignments_by_level() {
        let assignments = collaborator_assignments(
            &["prof".to_string()],
            &["ayudante".to_string()],
            &spec("tp1", &["alice"]),
        );

        assert_eq!(
            assignments,
            vec![
                CollaboratorAssignment {
                    username: "alice".to_string(),
                    permission: CollaboratorPermission::Write,
                },
                CollaboratorAssignment {
                    username: "ayudante".to_string(),
                    permission: CollaboratorPermission::Maintain,
                },
                CollaboratorAssignment {
                    username: "prof".to_string(),
                    permission: CollaboratorPermission::Admin,
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_login_keeps_highest_permission() {
        let assignments = collaborator_assignments(
            &["prof".to_string()],
            &["prof".to_string()],
            &spec("tp1", &["prof"]),
        );

        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].permission, CollaboratorPermission::Admin);
    }

    #[test]
    fn test_result_buckets() {
        let mut result = CreateRepositoriesResult::default();
        for status in [
            RepositoryCreationStatus::Created,
            RepositoryCreationStatus::FailedOnCreate,
            RepositoryCreationStatus::CreatedFailedAddingCollaborator,
        ] {
            result.push(RepositoryCreationOutcome {
                name: format!("{:?}", status),
                status,
                remote_id: None,
                failed_collaborator_usernames: Vec::new(),
            });
        }

        assert_eq!(result.len(), 3);
        assert_eq!(result.created().count(), 2);
        assert_eq!(result.failed[0].status, RepositoryCreationStatus::FailedOnCreate);
    }
}
