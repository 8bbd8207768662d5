//! Application configuration management

use std::env;

use anyhow::{Context, Result};

const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 8 * 60 * 60;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host (for generating URLs)
    pub host: Option<String>,

    /// Server port
    pub port: u16,

    /// SQLite connection URL
    pub database_url: String,

    pub database_max_connections: u32,

    /// Secret used to sign access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// GitHub REST base URL
    pub github_api_url: String,

    /// Service token used for repository provisioning
    pub github_token: Option<String>,

    /// OAuth app used for sign-in
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,

    /// `json` or `pretty`
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Development fallback; production deployments set JWT_SECRET explicitly
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using a generated development secret");
            format!("dev-secret-{}", uuid::Uuid::new_v4())
        });

        Ok(Self {
            host: env::var("HOST").ok(),

            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./data/teachhub.db".to_string()),

            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,

            jwt_secret,

            token_lifetime_secs: match env::var("TOKEN_LIFETIME_SECS") {
                Ok(value) => value.parse().context("Invalid TOKEN_LIFETIME_SECS")?,
                Err(_) => DEFAULT_TOKEN_LIFETIME_SECS,
            },

            github_api_url: env::var("GITHUB_API_URL")
                .unwrap_or_else(|_| "https://api.github.com".to_string()),

            github_token: non_empty_var("GITHUB_TOKEN"),

            github_client_id: non_empty_var("GITHUB_CLIENT_ID"),

            github_client_secret: non_empty_var("GITHUB_CLIENT_SECRET"),

            log_format: log_format_from_env(),
        })
    }
}

/// Read only the logging format, before the rest of the configuration
pub fn log_format_from_env() -> LogFormat {
    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
