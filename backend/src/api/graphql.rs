//! `/graphql` routes: GraphiQL on GET, queries and mutations on POST

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::Router;
use axum::extract::State;
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;

use crate::AppState;
use crate::graphql::AuthUser;

pub fn router() -> Router<AppState> {
    Router::new().route("/graphql", get(graphiql).post(graphql_handler))
}

fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        Html(GraphiQLSource::build().endpoint("/graphql").finish()).into_response()
    } else {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

/// Execute a request, attaching the caller when the bearer token verifies.
/// An invalid token leaves the request anonymous so guarded resolvers
/// answer `UNAUTHORIZED`.
async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    if let Some(token) = extract_token(&headers) {
        match state.auth.verify_token(token) {
            Ok(claims) => {
                tracing::debug!(user_id = %claims.sub, "Request authenticated");
                request = request.data(AuthUser::from(claims));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token verification failed");
            }
        }
    }

    state.schema.execute(request).await.into()
}
