//! Bulk repository provisioning for a course

use std::collections::{BTreeSet, HashMap};

use super::prelude::*;
use crate::services::{
    CreateRepositoriesRequest, RepositoryCreationOutcome, RepositorySpec, TemplateRepository,
    create_repositories,
};

#[derive(Default)]
pub struct RepositoryMutations;

/// Resolve user ids to GitHub logins, rejecting ids with no active user behind them
async fn resolve_logins(
    db: &Database,
    input: &CreateRepositoriesInput,
) -> Result<HashMap<String, String>> {
    let mut requested: Vec<String> = input
        .admin_ids
        .iter()
        .chain(&input.maintainer_ids)
        .chain(input.repositories.iter().flat_map(|r| &r.student_ids))
        .cloned()
        .collect();
    requested.sort();
    requested.dedup();
    for id in &requested {
        validate_id(id)?;
    }

    let logins = db
        .users()
        .github_ids_by_user_ids(&requested)
        .await
        .map_err(internal)?;

    let unknown: Vec<&str> = requested
        .iter()
        .filter(|id| !logins.contains_key(*id))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(bad_input(format!("Unknown or inactive user ids: {}", unknown.join(", "))));
    }

    Ok(logins)
}

fn to_logins(ids: &[String], logins: &HashMap<String, String>) -> Vec<String> {
    ids.iter().filter_map(|id| logins.get(id).cloned()).collect()
}

fn failure_summary(failed: usize, partially_failed: usize, not_recorded: &[String]) -> Option<String> {
    let mut parts = Vec::new();
    if failed > 0 {
        parts.push(format!("{} repositories could not be created", failed));
    }
    if partially_failed > 0 {
        parts.push(format!(
            "{} repositories are missing collaborators",
            partially_failed
        ));
    }
    if !not_recorded.is_empty() {
        parts.push(format!("not recorded: {}", not_recorded.join("; ")));
    }

    (!parts.is_empty()).then(|| parts.join(", "))
}

#[Object]
impl RepositoryMutations {
    /// Create one GitHub repository per request in the course organization
    /// and record the ones that exist afterwards.
    async fn create_repositories(
        &self,
        ctx: &Context<'_>,
        input: CreateRepositoriesInput,
    ) -> Result<CreateRepositoriesPayload> {
        require_course_permission(ctx, &input.course_id, Permission::ManageRepositories).await?;
        let db = ctx.data_unchecked::<Database>();
        let github = ctx.data_unchecked::<Arc<dyn GithubClient>>();

        let course = db
            .courses()
            .get(&input.course_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| not_found("Course", &input.course_id))?;

        let organization = input
            .organization
            .clone()
            .filter(|o| !o.trim().is_empty())
            .or(course.organization)
            .unwrap_or_default();

        let logins = resolve_logins(db, &input).await?;

        let request = CreateRepositoriesRequest {
            organization,
            repositories: input
                .repositories
                .iter()
                .map(|r| RepositorySpec {
                    name: r.name.clone(),
                    collaborator_usernames: to_logins(&r.student_ids, &logins)
                        .into_iter()
                        .collect::<BTreeSet<_>>(),
                    is_private: r.is_private,
                })
                .collect(),
            admins: to_logins(&input.admin_ids, &logins),
            maintainers: to_logins(&input.maintainer_ids, &logins),
            template: input.template.as_ref().map(|t| TemplateRepository {
                name: t.name.clone(),
                include_all_branches: t.include_all_branches,
            }),
        };

        let result = create_repositories(&**github, &request)
            .await
            .map_err(|e| bad_input(e.to_string()))?;

        let mut repositories = Vec::new();
        let mut not_recorded = Vec::new();
        for outcome in result.created() {
            match record_repository(db, &course.id, &input, outcome).await {
                Ok(repository) => repositories.push(repository),
                Err(e) => {
                    tracing::error!(
                        course_id = %course.id,
                        repository = %outcome.name,
                        error = %e,
                        "Failed to record created repository"
                    );
                    not_recorded.push(format!("{} ({})", outcome.name, e));
                }
            }
        }

        let error = failure_summary(result.failed.len(), result.partially_failed.len(), &not_recorded);

        Ok(CreateRepositoriesPayload {
            success: error.is_none(),
            error,
            successful: result.successful.into_iter().map(Into::into).collect(),
            partially_failed: result.partially_failed.into_iter().map(Into::into).collect(),
            failed: result.failed.into_iter().map(Into::into).collect(),
            repositories,
        })
    }

    async fn update_repository(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateRepositoryInput,
    ) -> Result<RepositoryResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let existing = db
            .repositories()
            .get(&id)
            .await
            .map_err(internal)?
            .ok_or_else(|| not_found("Repository", &id))?;
        require_course_permission(ctx, &existing.course_id, Permission::ManageRepositories).await?;

        let updated = db
            .repositories()
            .update(
                &id,
                UpdateRepository {
                    name: input.name,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => {
                let user_ids = db.repositories().list_user_ids(&record.id).await.map_err(internal)?;
                Ok(RepositoryResult::ok(Repository::new(record, user_ids)))
            }
            Ok(None) => Err(not_found("Repository", &id)),
            Err(e) => Ok(RepositoryResult::failure(e.to_string())),
        }
    }
}

/// Persist a repository that exists on GitHub together with its students.
/// Students come from the first request carrying the repository's name.
async fn record_repository(
    db: &Database,
    course_id: &str,
    input: &CreateRepositoriesInput,
    outcome: &RepositoryCreationOutcome,
) -> anyhow::Result<Repository> {
    let github_id = outcome
        .remote_id
        .ok_or_else(|| anyhow::anyhow!("created repository has no remote id"))?;
    let user_ids = input
        .repositories
        .iter()
        .find(|r| r.name == outcome.name)
        .map(|r| r.student_ids.clone())
        .unwrap_or_default();

    let record = db
        .repositories()
        .create(CreateRepository {
            course_id: course_id.to_string(),
            name: outcome.name.clone(),
            github_id,
            user_ids,
        })
        .await?;
    let user_ids = db.repositories().list_user_ids(&record.id).await?;

    Ok(Repository::new(record, user_ids))
}
