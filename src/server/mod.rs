//! HTTP surface: router, shared state, and error mapping.

pub mod handlers;
pub mod status;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;

use crate::error::ApiError;
use crate::services::{IngestPipeline, QueryService, TextChunker, VectorIndex};

pub use status::StatusTracker;

/// Shared per-process state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub chunker: TextChunker,
    pub pipeline: Arc<IngestPipeline>,
    pub query: Arc<QueryService>,
    pub store: Arc<dyn VectorIndex>,
    pub status: StatusTracker,
    pub batch_size: usize,
}

/// JSON error body returned for every non-2xx response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Embedding(_)
            | ApiError::Store(_)
            | ApiError::Generation(_)
            | ApiError::Pdf(_)
            | ApiError::ChunkConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (
            status,
            axum::Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/documents/ingest", post(handlers::ingest_documents))
        .route(
            "/documents/{id}",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        .route("/query/retrieve", post(handlers::retrieve))
        .route("/query/generate", post(handlers::generate))
        .route("/status", get(handlers::status))
        .layer(DefaultBodyLimit::max(handlers::MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Bind and serve until the shutdown future resolves.
pub async fn run(
    state: AppState,
    bind: &str,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
