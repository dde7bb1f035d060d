//! HTTP API server for integration with other systems.
//!
//! Exposes the question-answering pipeline as JSON endpoints.

use crate::cli::{Output, NO_CAPTIONS_MESSAGE};
use crate::config::Settings;
use crate::error::{ErrorKind, TubeQaError};
use crate::orchestrator::Orchestrator;
use crate::rag::Answer;
use crate::vector_store::IndexManifest;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let index_dir = orchestrator.settings().index_dir();
    let state = Arc::new(AppState { orchestrator });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/videos", get(list_videos))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("tubeqa API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    Output::kv("Index", &index_dir.display().to_string());
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("List Videos", "GET  /videos");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    url: String,
    #[serde(default)]
    question: String,
}

#[derive(Serialize)]
struct VideoListResponse {
    videos: Vec<IndexManifest>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    /// Machine-readable error kind.
    kind: &'static str,
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Response {
    let result: Result<Answer, TubeQaError> = state.orchestrator.ask(&req.url, &req.question).await;
    match result {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn list_videos(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.list_videos() {
        Ok(videos) => Json(VideoListResponse {
            total: videos.len(),
            videos,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Status code and body for a pipeline error.
fn error_parts(e: &TubeQaError) -> (StatusCode, ErrorResponse) {
    match e.kind() {
        ErrorKind::MalformedUrl => (
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                kind: "malformed_url",
                error: e.to_string(),
            },
        ),
        ErrorKind::InvalidInput => (
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                kind: "invalid_input",
                error: e.to_string(),
            },
        ),
        ErrorKind::NoCaptions => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorResponse {
                kind: "no_captions",
                error: NO_CAPTIONS_MESSAGE.to_string(),
            },
        ),
        ErrorKind::Collaborator => {
            error!("Request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    kind: "internal",
                    error: e.to_string(),
                },
            )
        }
    }
}

fn error_response(e: &TubeQaError) -> Response {
    let (status, body) = error_parts(e);
    (status, Json(body)).into_response()
}
