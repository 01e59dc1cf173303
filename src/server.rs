//! Local HTTP surface for the browser extension.
//!
//! The extension's popup and content script post their messages here instead
//! of to an in-browser background page. Tabs are tracked in memory; history
//! is persisted to `[history].path`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/messages` | Handle one extension message, return its outcome |
//! | `GET`  | `/history` | Recent imports, newest first |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "unknown variant `foo`" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500). A message that was
//! understood but failed (for example an empty selection) is not an HTTP
//! error; its outcome carries `"status": "failed"` and the error badge.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so extension pages can
//! call the server directly.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use harmony_core::history::relative_time;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::background::{Background, HistoryFile, InMemoryTabs, Message, Outcome};
use crate::config::Config;

type Worker = Arc<Background<InMemoryTabs>>;

/// Build the router with a fresh worker for `config`.
pub fn router(config: &Config) -> Router {
    let worker = Arc::new(Background::new(
        config.app.url.clone(),
        HistoryFile::new(config.history.path.clone()),
        InMemoryTabs::new(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/messages", post(handle_message))
        .route("/history", get(handle_history))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(worker)
}

/// Serve on `[server].bind` until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, history = %config.history.path.display(), "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /messages ============

/// Malformed JSON and unknown messages both get the JSON error body.
async fn handle_message(
    State(worker): State<Worker>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<Outcome>, AppError> {
    let Json(body) = payload.map_err(|e| bad_request(e.body_text()))?;
    let message: Message =
        serde_json::from_value(body).map_err(|e| bad_request(format!("invalid message: {}", e)))?;
    tracing::debug!(?message, "message received");
    Ok(Json(worker.handle(message).await))
}

// ============ GET /history ============

#[derive(Serialize)]
struct HistoryItem {
    text: String,
    url: String,
    #[serde(rename = "harmonyUrl")]
    harmony_url: String,
    timestamp: String,
    /// "5 minutes ago" and so on, relative to the request time.
    relative: String,
}

#[derive(Serialize)]
struct HistoryResponse {
    entries: Vec<HistoryItem>,
}

async fn handle_history(State(worker): State<Worker>) -> Result<Json<HistoryResponse>, AppError> {
    let history = worker
        .history()
        .load()
        .await
        .map_err(|e| internal(e.to_string()))?;
    let now = Utc::now();
    let entries = history
        .entries()
        .iter()
        .map(|e| HistoryItem {
            text: e.text.clone(),
            url: e.url.clone(),
            harmony_url: e.harmony_url.clone(),
            timestamp: e.timestamp.to_rfc3339(),
            relative: relative_time(e.timestamp, now),
        })
        .collect();
    Ok(Json(HistoryResponse { entries }))
}
