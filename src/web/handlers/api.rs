use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::web::{AppState, extractors::PageQuery, responses::ApiResponse};

/// `GET /api/v1/images`: the gallery page as JSON
pub async fn list_images(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    match state.gallery.page(query.page()).await {
        Ok(page) => ApiResponse::success(page).into_response(),
        Err(e) => {
            error!("Failed to list gallery: {}", e);
            ApiResponse::error(e.to_string()).into_response()
        }
    }
}
