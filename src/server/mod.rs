//! # HTTP Server for Canvas Building
//!
//! Exposes the canvas service as a JSON API.
//!
//! ## Usage
//!
//! ```bash
//! easel serve --listen 0.0.0.0:4000
//! ```
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | POST | `/api/canvas/init` | create a canvas |
//! | POST | `/api/canvas/elements` | append an element (JSON) |
//! | POST | `/api/canvas/add` | append an element (multipart, optional upload) |
//! | GET | `/api/canvas/export?id=` | download PDF (`&format=zip` for a zip) |
//! | GET | `/api/canvas/export/:id` | download PDF (`?format=zip` for a zip) |
//! | GET | `/api/canvas/:id` | session summary |
//! | GET | `/api/canvas/:id/preview` | full-size PNG |

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::EaselError;

const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;
const UPLOAD_BODY_LIMIT: usize = 50 * 1024 * 1024;

/// Build the API router around shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/canvas/init", post(handlers::canvas::init))
        .route("/api/canvas/elements", post(handlers::canvas::add_element))
        // Multipart API (50MB limit for uploads)
        .route(
            "/api/canvas/add",
            post(handlers::canvas::add_multipart).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/canvas/export", get(handlers::canvas::export_query))
        .route("/api/canvas/export/:id", get(handlers::canvas::export_path))
        .route("/api/canvas/:id", get(handlers::canvas::describe))
        .route("/api/canvas/:id/preview", get(handlers::canvas::preview))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use easel::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), easel::error::EaselError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:4000".to_string(),
///     ..Default::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), EaselError> {
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let app_state = Arc::new(AppState::new(config.clone())?);

    match config.session_ttl {
        Some(ttl) => {
            tokio::spawn(evict_idle_sessions(app_state.clone(), ttl));
        }
        None => info!("Session expiry disabled; canvases are kept until the process exits"),
    }

    let app = router(app_state);

    info!(
        listen = %config.listen_addr,
        upload_dir = %config.upload_dir.display(),
        export_scale = config.export.scale,
        export_quality = config.export.quality,
        "Easel HTTP server starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            EaselError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", config.listen_addr, e),
            ))
        })?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// Background task to drop idle canvases.
async fn evict_idle_sessions(state: Arc<AppState>, ttl: Duration) {
    let mut interval = tokio::time::interval(ttl.min(Duration::from_secs(60)));

    loop {
        interval.tick().await;
        let evicted = state.canvas.evict_idle(ttl).await;
        if evicted > 0 {
            let remaining = state.canvas.store().len().await;
            info!(evicted, remaining, "Evicted idle canvases");
        }
    }
}
