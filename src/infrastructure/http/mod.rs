pub mod request_id;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::controllers::{
    audiobooks::AudiobooksController, documents::DocumentsController, health,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::storage::FileStore;
use request_id::request_id_middleware;

// Uploads are capped at 50 MiB by storage validation; the body limit adds
// headroom for multipart framing.
const MAX_UPLOAD_BODY_BYTES: usize = 51 * 1024 * 1024;

/// Build the application router with all routes configured
pub fn build_router(
    documents_controller: Arc<DocumentsController>,
    audiobooks_controller: Arc<AudiobooksController>,
    document_storage: Arc<FileStore>,
) -> Router {
    // Document routes (list, upload, serve)
    let document_routes = Router::new()
        .route(
            "/api/documents",
            get(DocumentsController::list).post(DocumentsController::upload),
        )
        .route("/api/documents/:filename", get(DocumentsController::serve))
        .with_state(documents_controller)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));

    // Audiobook routes (create, download)
    let audiobook_routes = Router::new()
        .route("/api/audiobooks", post(AudiobooksController::create))
        .route(
            "/api/audiobooks/:filename",
            get(AudiobooksController::download),
        )
        .with_state(audiobooks_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(document_storage)
        .merge(document_routes)
        .merge(audiobook_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    documents_controller: Arc<DocumentsController>,
    audiobooks_controller: Arc<AudiobooksController>,
    document_storage: Arc<FileStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(
        documents_controller,
        audiobooks_controller,
        document_storage,
    );

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
