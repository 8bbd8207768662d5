//! TeachHub backend entry point

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use teachhub::config::{Config, LogFormat, log_format_from_env};
use teachhub::db::Database;
use teachhub::graphql::build_schema;
use teachhub::services::{AuthConfig, AuthService, GithubApiClient, GithubClient, OAuthApp};
use teachhub::{AppState, build_app};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "teachhub=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(log_format_from_env());

    let config = Arc::new(Config::from_env()?);
    tracing::info!(port = config.port, "Starting TeachHub backend");

    let db = Database::connect(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    tracing::info!("Database ready");

    if config.github_token.is_none() {
        tracing::warn!("GITHUB_TOKEN not set, repository provisioning will fail");
    }
    let github: Arc<dyn GithubClient> = Arc::new(GithubApiClient::new(
        config.github_api_url.clone(),
        config.github_token.clone(),
        OAuthApp {
            client_id: config.github_client_id.clone(),
            client_secret: config.github_client_secret.clone(),
        },
    )?);

    let auth = AuthService::new(
        db.clone(),
        github.clone(),
        AuthConfig {
            jwt_secret: config.jwt_secret.clone(),
            token_lifetime: config.token_lifetime_secs,
        },
    );

    let schema = build_schema(db.clone(), github, auth.clone());
    tracing::info!("GraphQL schema built");

    let state = AppState {
        config: config.clone(),
        db,
        schema,
        auth,
    };
    let app = build_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Listening");
    tracing::info!(
        "GraphQL playground: http://{}:{}/graphql",
        config.host.as_deref().unwrap_or("localhost"),
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
