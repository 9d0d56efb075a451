use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use ragserve::models::Config;
use ragserve::server::{AppState, StatusTracker};
use ragserve::services::{
    EmbeddingClient, GenerationClient, IngestPipeline, QueryService, TextChunker, VectorIndex,
    VectorStoreClient,
};

/// Document ingestion and retrieval service backed by Qdrant and Gemini.
#[derive(Debug, Parser)]
#[command(name = "ragserve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "RAGSERVE_BIND")]
    bind: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, short = 'c', env = "RAGSERVE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());

    let embedder = Arc::new(
        EmbeddingClient::new(&config.embedding).context("failed to build embedding client")?,
    );
    let generator = Arc::new(
        GenerationClient::new(&config.generation).context("failed to build generation client")?,
    );
    let store = Arc::new(
        VectorStoreClient::new(&config.vector_store, config.embedding.dimension)
            .context("failed to build vector store client")?,
    );

    let chunker = TextChunker::new(config.indexing.chunk_size, config.indexing.chunk_overlap)
        .context("invalid chunker configuration")?;

    let state = AppState {
        chunker,
        pipeline: Arc::new(IngestPipeline::new(embedder.clone(), store.clone())),
        query: Arc::new(QueryService::new(embedder, store.clone(), generator)),
        store: store.clone(),
        status: StatusTracker::new(),
        batch_size: config.indexing.batch_size,
    };

    // The collection must exist before the first request lands.
    store
        .ensure_collection()
        .await
        .context("failed to ensure collection")?;
    let points = store
        .collection_info()
        .await
        .ok()
        .flatten()
        .map_or(0, |info| info.points_count);
    tracing::info!(
        collection = store.collection(),
        dimension = config.embedding.dimension,
        points,
        "collection ready"
    );

    ragserve::server::run(state, &bind, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
