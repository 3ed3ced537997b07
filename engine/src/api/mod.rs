//! HTTP API surface
//!
//! Thin axum layer over the conversation orchestrator. Authentication,
//! sessions and CORS are handled by an upstream proxy; the caller's
//! identity arrives in `x-user-id` / `x-user-email` headers and is trusted
//! as-is.
//!
//! # Endpoints
//!
//! - POST /api/v1/narrative - Generate a narrative (new or continued thread)
//! - POST /api/v1/narrative/continue - Follow-up instruction on a thread
//! - GET /api/v1/chats - List the caller's conversations
//! - GET /api/v1/profile - Caller's account snapshot
//!
//! Every response uses the `{success, data | message}` envelope.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::chat::{Identity, NarrativeRequest, Orchestrator};
use crate::error::EngineError;

/// API server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/narrative", post(generate_narrative_handler))
        .route("/api/v1/narrative/continue", post(continue_handler))
        .route("/api/v1/chats", get(list_chats_handler))
        .route("/api/v1/profile", get(profile_handler))
        .route("/", get(index_handler))
        .with_state(state)
}

/// Bind and serve until a shutdown signal arrives
///
/// Returns once in-flight requests have drained, so the caller can close
/// the database afterwards.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received, draining requests");
    }
}

/// Body of a continue-conversation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContinueRequest {
    conversation_id: Option<String>,
    new_instruction: Option<String>,
}

async fn index_handler() -> &'static str {
    "brandloom"
}

async fn generate_narrative_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NarrativeRequest>,
) -> Response {
    let identity = match identity_from_headers(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match state
        .orchestrator
        .generate_narrative(&request, &identity)
        .await
    {
        Ok(outcome) => success(json!(outcome)),
        Err(err) => failure(err),
    }
}

async fn continue_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ContinueRequest>,
) -> Response {
    let identity = match identity_from_headers(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    let conversation_id = request.conversation_id.unwrap_or_default();
    let new_instruction = request.new_instruction.unwrap_or_default();

    match state
        .orchestrator
        .continue_conversation(&conversation_id, &new_instruction, &identity)
        .await
    {
        Ok(outcome) => success(json!(outcome)),
        Err(err) => failure(err),
    }
}

async fn list_chats_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = match identity_from_headers(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match state.orchestrator.list_conversations(&identity).await {
        Ok(summaries) => success(json!(summaries)),
        Err(err) => failure(err),
    }
}

async fn profile_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = match identity_from_headers(&headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };

    match state.orchestrator.account_profile(&identity).await {
        Ok(snapshot) => success(json!(snapshot)),
        Err(err) => failure(err),
    }
}

/// Read the upstream-authenticated identity from request headers
fn identity_from_headers(headers: &HeaderMap) -> Result<Identity, Response> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok());
    let email = headers
        .get("x-user-email")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match (user_id, email) {
        (Some(user_id), Some(email)) if !email.is_empty() => Ok(Identity { user_id, email }),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "message": "Missing or invalid identity headers",
            })),
        )
            .into_response()),
    }
}

fn success(data: serde_json::Value) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
        })),
    )
        .into_response()
}

fn failure(err: EngineError) -> Response {
    let status = match &err {
        EngineError::Validation(_) | EngineError::NoHistory => StatusCode::BAD_REQUEST,
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Generation(_) => StatusCode::BAD_GATEWAY,
        EngineError::Database(_) | EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(json!({
            "success": false,
            "message": err.to_string(),
            "hint": err.user_hint(),
        })),
    )
        .into_response()
}
