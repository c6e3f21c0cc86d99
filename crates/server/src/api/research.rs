//! # Research API
//!
//! `POST /research` streams progress notifications as Server-Sent Events,
//! one `data: {json}` frame per notification, ending with `complete` or
//! `error`.

use axum::{
    body::Body,
    extract::State,
    http::{header, Response, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json,
    },
};
use deep_research_core::models::{available_models, DEFAULT_MODEL};
use deep_research_core::state::ResearchState;
use deep_research_core::swarm::ProgressNotification;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::{OpenApi, ToSchema};

use super::SharedState;

/// Service name reported by the metadata endpoints
pub const SERVICE_NAME: &str = "Deep Research Agent API";

/// Service version reported by the metadata endpoints
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

// === API Types ===

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"topic": "Artificial Intelligence in Healthcare", "model": "openai/gpt-4o-mini"}))]
pub struct ResearchRequest {
    /// Research topic; must not be blank
    pub topic: String,
    /// Model selector; the configured default when omitted
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EndpointIndex {
    pub health: String,
    pub research: String,
    pub docs: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: EndpointIndex,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub models: Vec<ModelEntry>,
    pub default: String,
    /// Display name of the configured provider
    pub provider: String,
}

// === OpenAPI Definition ===

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Deep Research Agent API",
        description = "Iterative web research agent that streams its progress and writes a cited report"
    ),
    paths(root, health, list_models, start_research),
    components(schemas(
        ResearchRequest,
        ErrorResponse,
        HealthResponse,
        ServiceInfo,
        EndpointIndex,
        ModelsResponse,
        ModelEntry
    )),
    tags(
        (name = "research", description = "Research runs"),
        (name = "meta", description = "Service metadata")
    )
)]
pub struct ApiDoc;

// === API Handlers ===

/// Service metadata
#[utoipa::path(
    get,
    path = "/",
    tag = "meta",
    responses((status = 200, description = "Service metadata", body = ServiceInfo))
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: SERVICE_NAME.to_string(),
        version: API_VERSION.to_string(),
        endpoints: EndpointIndex {
            health: "/health".to_string(),
            research: "/research (POST)".to_string(),
            docs: "/openapi.json".to_string(),
        },
    })
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "meta",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: API_VERSION.to_string(),
    })
}

/// Selectable models
#[utoipa::path(
    get,
    path = "/models",
    tag = "meta",
    responses((status = 200, description = "Models offered to clients", body = ModelsResponse))
)]
pub async fn list_models(State(state): State<SharedState>) -> Json<ModelsResponse> {
    let models = available_models()
        .into_iter()
        .map(|m| ModelEntry {
            id: m.id,
            name: m.name,
            description: m.description,
        })
        .collect();
    Json(ModelsResponse {
        models,
        default: state.default_model.clone(),
        provider: state.provider.display_name().to_string(),
    })
}

/// Run a research task, streaming progress as Server-Sent Events
#[utoipa::path(
    post,
    path = "/research",
    tag = "research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Stream of update, complete and error events", content_type = "text/event-stream", body = String),
        (status = 400, description = "Blank topic", body = ErrorResponse)
    )
)]
pub async fn start_research(
    State(state): State<SharedState>,
    Json(req): Json<ResearchRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                detail: "Topic cannot be empty".to_string(),
            }),
        ));
    }

    let model = req
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.default_model.clone());
    tracing::info!(topic = %topic, model = %model, "Research requested");

    let events = state
        .graph
        .stream(ResearchState::new(topic, model))
        .flat_map(|event| stream::iter(ProgressNotification::from_engine_event(&event)))
        .map(|notification| Ok::<_, Infallible>(Event::default().data(notification.to_json())));

    Ok((
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(events).keep_alive(KeepAlive::default()),
    ))
}

// === OpenAPI Handler ===

pub async fn serve_openapi() -> impl IntoResponse {
    match ApiDoc::openapi().to_json() {
        Ok(spec) => Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(spec))
            .map(IntoResponse::into_response)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(e) => {
            tracing::error!("Failed to render OpenAPI document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Default request model when the configuration names none
pub fn fallback_model(configured: &str) -> String {
    if configured.trim().is_empty() {
        DEFAULT_MODEL.to_string()
    } else {
        configured.to_string()
    }
}
