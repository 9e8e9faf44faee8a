//! Web layer module
//!
//! HTTP interface for the gallery: the themed HTML page, a JSON listing,
//! static files for originals and thumbnails, and a health endpoint.
//!
//! # Architecture
//!
//! - **Handlers**: thin request handlers delegating to [`GalleryService`]
//! - **Responses**: the JSON envelope and health document
//! - **Themes**: compiled askama templates
//! - **Middleware**: request logging

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, services::ServeDir, set_header::SetResponseHeader};
use tracing::{error, info};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::gallery::GalleryService;

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod themes;

pub use responses::ApiResponse;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gallery: GalleryService,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            gallery: GalleryService::from_config(&config),
            config: Arc::new(config),
            started_at: chrono::Utc::now(),
        }
    }
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    addr: SocketAddr,
}

impl WebServer {
    pub fn new(config: Config) -> AppResult<Self> {
        let addr = config.listen_addr()?;
        let app = Self::router(AppState::new(config));
        Ok(Self { app, addr })
    }

    /// Create the router with all routes, static mounts and middleware
    pub fn router(state: AppState) -> Router {
        let max_age = state.config.basic_settings.cache_expiration;

        let mut router = Router::new()
            .route("/", get(handlers::gallery::gallery_page))
            .route("/health", get(handlers::health::health_check))
            .route("/api/v1/images", get(handlers::api::list_images));

        for (prefix, dir) in state.gallery.mounts().iter() {
            router = router.nest_service(prefix, static_files(dir, max_age));
        }

        router
            .layer(CorsLayer::permissive())
            .layer(axum::middleware::from_fn(
                middleware::request_logging_middleware,
            ))
            .with_state(state)
    }

    /// Serve until SIGTERM or SIGINT
    pub async fn serve(self) -> AppResult<()> {
        self.serve_with_signal(shutdown_signal()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests
    pub async fn serve_with_signal<F>(self, signal: F) -> AppResult<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| AppError::Bind {
                addr: self.addr.to_string(),
                message: e.to_string(),
            })?;
        info!("Gallery listening on http://{}", self.addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(signal)
            .await?;
        info!("Web server stopped");
        Ok(())
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

/// Files below `dir`, with `Cache-Control` when `max_age` is non-zero
fn static_files(dir: &Path, max_age: u64) -> SetResponseHeader<ServeDir, Option<HeaderValue>> {
    let cache_control = (max_age > 0)
        .then(|| HeaderValue::from_str(&format!("public, max-age={max_age}")).ok())
        .flatten();
    SetResponseHeader::overriding(ServeDir::new(dir), header::CACHE_CONTROL, cache_control)
}

/// Resolves on SIGTERM or SIGINT (Ctrl+C elsewhere)
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
                    _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), shutting down gracefully"),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handlers: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down gracefully"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}
