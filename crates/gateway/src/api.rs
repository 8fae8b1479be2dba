//! Dashboard JSON API.
//!
//! Endpoints (nested under `/api`):
//!
//! - `GET  /api/status`   — data files, provider, blocking reason, turn phase
//! - `GET  /api/diagram`  — the DTI image
//! - `GET  /api/preview`  — first rows of the what-if matrix (`?rows=N`)
//! - `GET  /api/history`  — the chat transcript
//! - `POST /api/chat`     — ask one question
//! - `POST /api/reset`    — start a new session

use std::path::Path;

use axum::{
    Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hclaudit_assistant::TurnPhase;
use hclaudit_core::{Error, Message, Usage};
use hclaudit_matrix::{EnvironmentReport, FileStatus};

use crate::SharedState;

/// Position of the what-if matrix among the configured matrices.
const WHAT_IF_INDEX: usize = 2;
/// Upper bound for `?rows=`.
const MAX_PREVIEW_ROWS: usize = 500;

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/diagram", get(diagram_handler))
        .route("/preview", get(preview_handler))
        .route("/history", get(history_handler))
        .route("/chat", post(chat_handler))
        .route("/reset", post(reset_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// HTTP status for each failure kind.
fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::EmptyInput => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Transport(_) => StatusCode::BAD_GATEWAY,
        Error::DataUnavailable(_) | Error::Configuration { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::UnpairedReply | Error::Serialization(_) | Error::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    chat_ready: bool,
    blocked_reason: Option<String>,
    provider: Option<String>,
    model: String,
    files: Vec<FileStatus>,
    diagram_available: bool,
    session_id: Option<String>,
    phase: TurnPhase,
    messages: usize,
}

#[derive(Deserialize)]
struct PreviewQuery {
    rows: Option<usize>,
}

#[derive(Serialize)]
struct PreviewResponse {
    label: String,
    file: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct HistoryResponse {
    session_id: String,
    phase: TurnPhase,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
    model: String,
    usage: Option<Usage>,
    elapsed_ms: u64,
    messages: usize,
}

#[derive(Serialize)]
struct ResetResponse {
    session_id: String,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    let report = EnvironmentReport::inspect(&state.config.data);
    let gate = state.gate().await;
    let assistant = gate.assistant();

    // A held lock means a turn is running.
    let (session_id, phase, messages) = match state.session.try_lock() {
        Ok(session) => (
            Some(session.id().to_string()),
            session.phase(),
            session.history().len(),
        ),
        Err(_) => (None, TurnPhase::RequestInFlight, 0),
    };

    Json(StatusResponse {
        chat_ready: assistant.is_some(),
        blocked_reason: gate.blocked_reason().map(String::from),
        provider: assistant.map(|a| a.provider_name().to_string()),
        model: state.config.model.clone(),
        diagram_available: report.diagram().is_some(),
        files: report.files,
        session_id,
        phase,
        messages,
    })
}

async fn diagram_handler(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let path = state.config.data.diagram_path();
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("La imagen del DTI no se encontró ({}): {e}", path.display()),
        )
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, image_content_type(&path))],
        bytes,
    )
        .into_response())
}

fn image_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

async fn preview_handler(
    State(state): State<SharedState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let rows = query
        .rows
        .unwrap_or(state.config.data.preview_rows)
        .min(MAX_PREVIEW_ROWS);

    let matrix = state
        .store
        .preview(WHAT_IF_INDEX, rows)
        .await
        .map_err(|e| api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No what-if matrix configured"))?;

    Ok(Json(PreviewResponse {
        label: matrix.label,
        file: matrix
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        headers: matrix.table.headers,
        rows: matrix.table.rows,
    }))
}

async fn history_handler(State(state): State<SharedState>) -> Json<HistoryResponse> {
    let session = state.session.lock().await;
    Json(HistoryResponse {
        session_id: session.id().to_string(),
        phase: session.phase(),
        messages: session.history().messages().to_vec(),
    })
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let gate = state.gate().await;
    let Some(assistant) = gate.assistant() else {
        let reason = gate.blocked_reason().unwrap_or("chat disabled");
        warn!(reason, "Chat request refused");
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, reason));
    };

    info!(message_len = payload.message.len(), "Chat request");

    let mut session = state.session.lock().await;
    let result = assistant.submit(&mut session, &payload.message).await;
    session.finish_turn();

    match result {
        Ok(outcome) => Ok(Json(ChatResponse {
            answer: outcome.answer,
            model: outcome.model,
            usage: outcome.usage,
            elapsed_ms: outcome.elapsed_ms,
            messages: session.history().len(),
        })),
        Err(e) => {
            let status = status_for(&e);
            let message = match &e {
                Error::Transport(inner) => format!("Error de comunicación con el modelo: {inner}"),
                other => other.to_string(),
            };
            Err(api_error(status, message))
        }
    }
}

async fn reset_handler(State(state): State<SharedState>) -> Json<ResetResponse> {
    let mut session = state.session.lock().await;
    session.reset();
    info!(session = %session.id(), "Session reset");
    Json(ResetResponse {
        session_id: session.id().to_string(),
    })
}
