pub mod actions;
pub mod chain;
pub mod config;
pub mod crypto;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod processor;
pub mod routes;
pub mod state;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::state::{AppState, ProcessorBuilder, SharedState};

pub fn build_app(server: ServerConfig, build_processor: ProcessorBuilder) -> (Router, SharedState) {
    let state: SharedState = Arc::new(AppState::new(server, build_processor));

    let app = Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

async fn health() -> &'static str {
    "ok"
}
