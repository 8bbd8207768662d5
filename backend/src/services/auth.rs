//! Authentication service: GitHub OAuth login and JWT handling
//!
//! Users sign in with GitHub. The OAuth callback code is exchanged for a
//! user access token, the GitHub login it belongs to is matched against
//! `users.github_id`, and an HS256 access token is issued.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::github::GithubClient;
use crate::db::{CreateUser, Database, UserRecord};

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,
    /// GitHub login
    pub github_id: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Profile fields supplied on registration; the GitHub login comes from OAuth
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub last_name: String,
    pub file: Option<String>,
    pub notification_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: UserRecord,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub token_lifetime: i64,
}

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    github: Arc<dyn GithubClient>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: Database, github: Arc<dyn GithubClient>, config: AuthConfig) -> Self {
        Self { db, github, config }
    }

    /// Sign in an existing, active user
    pub async fn login(&self, code: &str) -> Result<LoginResult> {
        let login = self.github_login(code).await?;

        let user = self
            .db
            .users()
            .get_by_github_id(&login)
            .await?
            .ok_or_else(|| anyhow!("User {} is not registered", login))?;

        if !user.active {
            return Err(anyhow!("Account is disabled"));
        }

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, github_id = %user.github_id, "User logged in");

        Ok(LoginResult { user, token })
    }

    /// Create the user for the GitHub account behind `code` and sign them in
    pub async fn register(&self, code: &str, input: RegisterInput) -> Result<LoginResult> {
        let login = self.github_login(code).await?;
        let users = self.db.users();

        if users.get_by_github_id(&login).await?.is_some() {
            return Err(anyhow!("GitHub account {} is already registered", login));
        }

        let user = users
            .create(CreateUser {
                name: input.name,
                last_name: input.last_name,
                file: input.file,
                github_id: login,
                notification_email: input.notification_email,
                is_admin: false,
            })
            .await?;

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = %user.id, github_id = %user.github_id, "User registered");

        Ok(LoginResult { user, token })
    }

    async fn github_login(&self, code: &str) -> Result<String> {
        let access_token = self
            .github
            .exchange_oauth_code(code)
            .await
            .context("GitHub OAuth code exchange failed")?;

        let github_user = self
            .github
            .authenticated_user(&access_token)
            .await
            .context("Failed to fetch GitHub user")?;

        Ok(github_user.login)
    }

    /// Sign an access token for `user`
    pub fn issue_token(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id.clone(),
            github_id: user.github_id.clone(),
            is_admin: user.is_admin,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.config.token_lifetime)).timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .context("Failed to sign access token")
    }

    /// Decode and validate an access token
    pub fn verify_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::github::{
        CollaboratorPermission, CreatedRepository, GithubError, GithubUser, NewRepository,
        TemplateRepository,
    };
    use async_trait::async_trait;

    /// Answers every OAuth code with the login `ada`
    struct OAuthOnly;

    #[async_trait]
    impl GithubClient for OAuthOnly {
        async fn create_repository(
            &self,
            _: &str,
            _: &NewRepository,
        ) -> Result<CreatedRepository, GithubError> {
            unimplemented!()
        }

        async fn create_repository_from_template(
            &self,
            _: &str,
            _: &TemplateRepository,
            _: &NewRepository,
        ) -> Result<CreatedRepository, GithubError> {
            unimplemented!()
        }

        async fn add_collaborator(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: CollaboratorPermission,
        ) -> Result<(), GithubError> {
            unimplemented!()
        }

        async fn authenticated_user(&self, token: &str) -> Result<GithubUser, GithubError> {
            assert_eq!(token, "gho_token");
            Ok(GithubUser {
                id: 1,
                login: "ada".to_string(),
                name: None,
                email: None,
            })
        }

        async fn exchange_oauth_code(&self, code: &str) -> Result<String, GithubError> {
            if code == "good" {
                Ok("gho_token".to_string())
            } else {
                Err(GithubError::Api {
                    status: 400,
                    message: "bad_verification_code".to_string(),
                })
            }
        }

        fn authorize_url(&self, _: &str) -> Result<String, GithubError> {
            unimplemented!()
        }
    }

    async fn service(lifetime: i64) -> AuthService {
        let db = Database::in_memory().await.unwrap();
        AuthService::new(
            db,
            Arc::new(OAuthOnly),
            AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_lifetime: lifetime,
            },
        )
    }

    fn register_input() -> RegisterInput {
        RegisterInput {
            name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            file: Some("100000".to_string()),
            notification_email: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service(3600).await;

        assert!(auth.login("good").await.is_err());

        let registered = auth.register("good", register_input()).await.unwrap();
        assert_eq!(registered.user.github_id, "ada");

        let logged_in = auth.login("good").await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let claims = auth.verify_token(&logged_in.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);
        assert_eq!(claims.github_id, "ada");
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let auth = service(3600).await;
        auth.register("good", register_input()).await.unwrap();
        assert!(auth.register("good", register_input()).await.is_err());
    }

    #[tokio::test]
    async fn test_bad_code_rejected() {
        let auth = service(3600).await;
        assert!(auth.register("bad", register_input()).await.is_err());
    }

    #[tokio::test]
    async fn test_expired_and_tampered_tokens_rejected() {
        let auth = service(-120).await;
        let user = auth.register("good", register_input()).await.unwrap();
        assert!(auth.verify_token(&user.token).is_err());

        let valid = service(3600).await;
        let token = valid.issue_token(&user.user).unwrap();
        let other = AuthService::new(
            Database::in_memory().await.unwrap(),
            Arc::new(OAuthOnly),
            AuthConfig {
                jwt_secret: "another-secret".to_string(),
                token_lifetime: 3600,
            },
        );
        assert!(other.verify_token(&token).is_err());
    }
}
