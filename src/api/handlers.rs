//! HTTP request handlers

use super::types::{ErrorResponse, SessionCreatedResponse, SuccessResponse, TurnRequest};
use super::AppState;
use crate::runtime::{RouterError, SessionSummary, TurnReply};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/end", post(end_session))
        // Turns
        .route("/api/sessions/:id/turn", post(run_turn))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<SessionCreatedResponse> {
    let session_id = state.registry.create_session().await;
    Json(SessionCreatedResponse { session_id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(state.registry.session_info(&id).await?))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.registry.end_session(&id).await?;
    Ok(Json(SuccessResponse::ok()))
}

// ============================================================
// Turns
// ============================================================

/// Engine failures are part of the reply, not an HTTP error
async fn run_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnReply>, AppError> {
    Ok(Json(state.registry.handle_turn(&id, &req.text).await?))
}

async fn get_version() -> &'static str {
    concat!("contextgate ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl From<RouterError> for AppError {
    fn from(error: RouterError) -> Self {
        match error {
            RouterError::NoActiveSession(_) => AppError::NotFound(error.to_string()),
            RouterError::EmptyTurn => AppError::BadRequest(error.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
