use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::crypto;
use crate::processor::RunSummary;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new().route("/run", get(run).post(run))
}

/// Run one invocation on demand and report its summary.
async fn run(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(expected) = &state.server.trigger_token {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();

        if !crypto::secrets_match(expected.expose(), provided) {
            tracing::warn!("Rejected /run request with a missing or invalid token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(RunSummary::failure("Unauthorized")),
            )
                .into_response();
        }
    }

    match state.invoke().await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => e.into_response(),
    }
}
