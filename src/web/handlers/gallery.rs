//! HTML gallery page

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::web::{
    AppState,
    extractors::PageQuery,
    themes::{self, GalleryView},
};

/// `GET /`
///
/// Renders the requested page with the configured theme. A gallery directory
/// that cannot be listed produces a 500 error page for this request only.
pub async fn gallery_page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    let page = match state.gallery.page(query.page()).await {
        Ok(page) => page,
        Err(e) => {
            error!("Failed to list gallery: {}", e);
            return themes::error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    match themes::render_gallery(state.config.basic_settings.theme_name, GalleryView::from(page)) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render gallery page: {}", e);
            themes::error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render gallery")
        }
    }
}
