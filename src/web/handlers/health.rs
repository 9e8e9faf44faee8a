//! Health check handler

use axum::{Json, extract::State};

use crate::web::{AppState, responses::HealthResponse};

/// `GET /health`
///
/// Always answers 200; `gallery_readable` reports whether the gallery
/// directory can be opened right now.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let gallery_readable = tokio::fs::read_dir(state.gallery.cache().source_dir())
        .await
        .is_ok();
    Json(HealthResponse::new(state.started_at, gallery_readable))
}
