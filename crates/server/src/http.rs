//! HTTP Endpoints
//!
//! JSON API for the bilingual chatbot.

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parsbot_core::{Error, ErrorCategory, Turn};
use parsbot_llm::RegistryState;
use parsbot_text_processing::CacheStats;

use crate::session::Session;
use crate::state::AppState;

const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    drop(config);

    Router::new()
        // Session endpoints
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/cache/clear", post(clear_cache))
        // Chat endpoint
        .route("/api/chat/:session_id", post(chat))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Admin endpoints
        .route("/admin/reload-config", post(reload_config))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - disabled: permissive (development only)
/// - no valid origins: localhost:3000
/// - otherwise: the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(FALLBACK_ORIGIN))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

/// One transcript entry as shown to the user
#[derive(Debug, Serialize)]
struct TurnView {
    role: &'static str,
    text: String,
    timestamp: String,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role().as_str(),
            text: turn.text().to_string(),
            timestamp: turn.timestamp().to_rfc3339(),
        }
    }
}

fn transcript(session: &Session) -> Vec<TurnView> {
    session
        .conversation
        .transcript()
        .iter()
        .map(TurnView::from)
        .collect()
}

/// Session summary
#[derive(Debug, Serialize)]
struct SessionView {
    session_id: String,
    active: bool,
    pending: bool,
    started_at: String,
    turn_count: usize,
    successful_exchanges: usize,
    transcript: Vec<TurnView>,
    cache: CacheStats,
    registry: RegistryState,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let conversation = &session.conversation;
        Self {
            session_id: session.id.clone(),
            active: session.is_active(),
            pending: conversation.is_pending(),
            started_at: conversation.started_at().to_rfc3339(),
            turn_count: conversation.turn_count(),
            successful_exchanges: conversation.successful_exchanges(),
            transcript: transcript(session),
            cache: conversation.chatbot().cache_stats(),
            registry: conversation.chatbot().registry_state(),
        }
    }
}

fn not_found(id: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "session_not_found",
            "session_id": id,
        })),
    )
}

/// Create session
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    match state.create_session() {
        Ok(session) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "session_id": session.id })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create session");
            let message = e.to_string();
            (
                StatusCode::from(e),
                Json(serde_json::json!({ "error": message })),
            )
        },
    }
}

/// Get session info
async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.sessions.get(&id) {
        Some(session) => (
            StatusCode::OK,
            Json(serde_json::json!(SessionView::from(session.as_ref()))),
        ),
        None => not_found(&id),
    }
}

/// Delete session
async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    if state.sessions.remove(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// List sessions
async fn list_sessions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "sessions": sessions,
        "count": sessions.len(),
    }))
}

/// Clear one session's translation cache
async fn clear_cache(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let Some(session) = state.sessions.get(&id) else {
        return not_found(&id);
    };

    session.touch();
    session.conversation.clear_cache();
    tracing::info!(session_id = %id, "Cleared translation cache on request");

    (
        StatusCode::OK,
        Json(serde_json::json!({ "cache": session.conversation.chatbot().cache_stats() })),
    )
}

/// Chat request
#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    num_beams: Option<usize>,
}

/// Chat response
#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    transcript: Vec<TurnView>,
    turn_count: usize,
}

/// User-facing chat failure; internal detail stays in the logs
#[derive(Debug, Serialize)]
struct ChatFailure {
    category: ErrorCategory,
    message: &'static str,
}

fn category_status(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCategory::GenerationFailed => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn category_failure(category: ErrorCategory) -> (StatusCode, Json<serde_json::Value>) {
    let body = ChatFailure {
        category,
        message: category.message(),
    };
    (category_status(category), Json(serde_json::json!(body)))
}

fn chat_failure(error: &Error) -> (StatusCode, Json<serde_json::Value>) {
    category_failure(error.category())
}

/// Chat endpoint
async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Some(session) = state.sessions.get(&session_id) else {
        return not_found(&session_id);
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(session_id = %session_id, error = %rejection, "Rejected chat body");
            return category_failure(ErrorCategory::InvalidInput);
        },
    };

    session.touch();

    let defaults = session.conversation.config();
    let max_length = request.max_length.unwrap_or(defaults.max_length);
    let num_beams = request.num_beams.unwrap_or(defaults.num_beams);

    let result = session
        .conversation
        .submit_with(&request.message, max_length, num_beams)
        .await;
    session.touch();

    match result {
        Ok(response) => {
            let body = ChatResponse {
                response,
                transcript: transcript(&session),
                turn_count: session.conversation.turn_count(),
            };
            (StatusCode::OK, Json(serde_json::json!(body)))
        },
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Chat error");
            chat_failure(&e)
        },
    }
}

/// Liveness
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: not ready once the model registry has failed
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let registry = state.registry.state();
    let ready = registry != RegistryState::Failed;

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "checks": {
                "models": { "status": registry },
                "sessions": { "status": "ok", "count": state.sessions.count() },
            }
        })),
    )
}

/// Config reload endpoint
///
/// Only sessions created after the reload see the new settings.
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.reload_config() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "Configuration reloaded successfully"
            })),
        ),
        Err(e) => {
            tracing::error!("Config reload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string()
                })),
            )
        },
    }
}
