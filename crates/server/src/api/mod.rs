//! # HTTP API
//!
//! Router for the research service: the streaming research endpoint plus
//! service metadata, model discovery and the OpenAPI document.

pub mod research;

use axum::{http::HeaderValue, routing::get, routing::post, Router};
use deep_research_core::models::LlmProvider;
use deep_research_core::swarm::ResearchGraph;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state
pub struct AppState {
    pub graph: ResearchGraph,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Provider serving every model selector
    pub provider: LlmProvider,
}

pub type SharedState = Arc<AppState>;

/// Build the full router with CORS for `allowed_origins`
pub fn router(state: SharedState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(research::root))
        .route("/health", get(research::health))
        .route("/models", get(research::list_models))
        .route("/research", post(research::start_research))
        .route("/openapi.json", get(research::serve_openapi))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
