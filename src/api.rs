use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tower_http::cors::CorsLayer;

use crate::status::{CycleStatus, StatusBoard};

/// Read-only status surface:
/// - `GET /` plain status line
/// - `GET /health` liveness
/// - `GET /status` full status as JSON
pub fn router(status: Arc<StatusBoard>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(|| async { "OK" }))
        .route("/status", get(status_json))
        .layer(CorsLayer::very_permissive())
        .with_state(status)
}

async fn index(State(status): State<Arc<StatusBoard>>) -> String {
    let s = status.snapshot();
    format!(
        "{} Tracker\nStatus: {}\nMode: {}\n",
        s.subject,
        s.summary(),
        s.mode.as_str()
    )
}

async fn status_json(State(status): State<Arc<StatusBoard>>) -> Json<CycleStatus> {
    Json((*status.snapshot()).clone())
}
