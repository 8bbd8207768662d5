//! GitHub REST client
//!
//! Base URL: https://api.github.com (overridable for GitHub Enterprise).
//! Provisioning calls use the service token from configuration; OAuth
//! calls use the client id/secret of the GitHub OAuth app.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{
    CollaboratorPermission, CreatedRepository, GithubClient, GithubError, GithubUser,
    NewRepository, TemplateRepository,
};

const API_VERSION: &str = "2022-11-28";
const OAUTH_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const OAUTH_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";

/// OAuth app credentials
#[derive(Debug, Clone, Default)]
pub struct OAuthApp {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// reqwest-backed [`GithubClient`]
pub struct GithubApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    oauth: OAuthApp,
}

#[derive(Debug, Serialize)]
struct CreateRepositoryBody<'a> {
    name: &'a str,
    private: bool,
}

#[derive(Debug, Serialize)]
struct GenerateRepositoryBody<'a> {
    owner: &'a str,
    name: &'a str,
    private: bool,
    include_all_branches: bool,
}

#[derive(Debug, Serialize)]
struct AddCollaboratorBody {
    permission: &'static str,
}

/// Creation response; only `id` and `name` are needed
#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    id: Option<i64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl GithubApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>, oauth: OAuthApp) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("teachhub/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            oauth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_service_token(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Turn a non-2xx response into [`GithubError::Api`]
    async fn check(response: Response) -> Result<Response, GithubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

        Err(GithubError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_created(response: Response) -> Result<CreatedRepository, GithubError> {
        let body: RepositoryResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GithubError::MalformedResponse(e.to_string()))?;

        created_repository(body.id, body.name)
    }
}

/// A creation response is only usable when it carries both `id` and `name`
fn created_repository(id: Option<i64>, name: Option<String>) -> Result<CreatedRepository, GithubError> {
    match (id, name) {
        (Some(id), Some(name)) => Ok(CreatedRepository { id, name }),
        (id, name) => Err(GithubError::MalformedResponse(format!(
            "creation response missing fields (id: {:?}, name: {:?})",
            id, name
        ))),
    }
}

#[async_trait]
impl GithubClient for GithubApiClient {
    async fn create_repository(
        &self,
        organization: &str,
        repository: &NewRepository,
    ) -> Result<CreatedRepository, GithubError> {
        debug!(organization, repository = %repository.name, "Creating GitHub repository");

        let request = self
            .http
            .post(self.url(&format!("/orgs/{}/repos", organization)))
            .json(&CreateRepositoryBody {
                name: &repository.name,
                private: repository.private,
            });

        let response = self.with_service_token(request).send().await?;
        Self::parse_created(response).await
    }

    async fn create_repository_from_template(
        &self,
        organization: &str,
        template: &TemplateRepository,
        repository: &NewRepository,
    ) -> Result<CreatedRepository, GithubError> {
        debug!(
            organization,
            template = %template.name,
            repository = %repository.name,
            "Creating GitHub repository from template"
        );

        let request = self
            .http
            .post(self.url(&format!("/repos/{}/{}/generate", organization, template.name)))
            .json(&GenerateRepositoryBody {
                owner: organization,
                name: &repository.name,
                private: repository.private,
                include_all_branches: template.include_all_branches,
            });

        let response = self.with_service_token(request).send().await?;
        Self::parse_created(response).await
    }

    async fn add_collaborator(
        &self,
        owner: &str,
        repository: &str,
        username: &str,
        permission: CollaboratorPermission,
    ) -> Result<(), GithubError> {
        let request = self
            .http
            .put(self.url(&format!(
                "/repos/{}/{}/collaborators/{}",
                owner, repository, username
            )))
            .json(&AddCollaboratorBody {
                permission: permission.as_github_str(),
            });

        let response = self.with_service_token(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn authenticated_user(&self, access_token: &str) -> Result<GithubUser, GithubError> {
        let response = self
            .http
            .get(self.url("/user"))
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        let user: UserResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GithubError::MalformedResponse(e.to_string()))?;

        Ok(GithubUser {
            id: user.id,
            login: user.login,
            name: user.name,
            email: user.email,
        })
    }

    async fn exchange_oauth_code(&self, code: &str) -> Result<String, GithubError> {
        let (client_id, client_secret) = match (&self.oauth.client_id, &self.oauth.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => return Err(GithubError::NotConfigured("GitHub OAuth app")),
        };

        let response = self
            .http
            .post(OAUTH_TOKEN_URL)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await?;

        let body: TokenResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| GithubError::MalformedResponse(e.to_string()))?;

        // GitHub reports a bad code with 200 and an `error` field
        match (body.access_token, body.error) {
            (Some(token), None) => Ok(token),
            (_, Some(error)) => Err(GithubError::Api {
                status: 400,
                message: body.error_description.unwrap_or(error),
            }),
            (None, None) => Err(GithubError::MalformedResponse(
                "token response without access_token".to_string(),
            )),
        }
    }

    fn authorize_url(&self, state: &str) -> Result<String, GithubError> {
        let client_id = self
            .oauth
            .client_id
            .as_deref()
            .ok_or(GithubError::NotConfigured("GitHub OAuth app"))?;

        let url = Url::parse_with_params(
            OAUTH_AUTHORIZE_URL,
            &[("client_id", client_id), ("scope", "read:user"), ("state", state)],
        )
        .map_err(|e| GithubError::MalformedResponse(e.to_string()))?;

        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(oauth: OAuthApp) -> GithubApiClient {
        GithubApiClient::new("https://api.github.com/", Some("token".to_string()), oauth).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = client(OAuthApp::default());
        assert_eq!(client.url("/user"), "https://api.github.com/user");
    }

    #[test]
    fn test_authorize_url() {
        let client = client(OAuthApp {
            client_id: Some("abc123".to_string()),
            client_secret: None,
        });

        let url = Url::parse(&client.authorize_url("xyz state").unwrap()).unwrap();
        assert_eq!(url.host_str(), Some("github.com"));
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("client_id".to_string(), "abc123".to_string())));
        assert!(params.contains(&("state".to_string(), "xyz state".to_string())));
    }

    #[test]
    fn test_created_repository_requires_id_and_name() {
        let created = created_repository(Some(42), Some("tp-ada".to_string())).unwrap();
        assert_eq!(created.id, 42);
        assert_eq!(created.name, "tp-ada");

        for (id, name) in [(Some(42), None), (None, Some("tp-ada".to_string())), (None, None)] {
            assert!(matches!(
                created_repository(id, name),
                Err(GithubError::MalformedResponse(_))
            ));
        }
    }

    #[test]
    fn test_authorize_url_requires_client_id() {
        let client = client(OAuthApp::default());
        assert!(matches!(
            client.authorize_url("s"),
            Err(GithubError::NotConfigured(_))
        ));
    }
}
