mod config;
mod document;
mod query;

pub use config::{
    Config, DEFAULT_BIND_ADDR, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_DIMENSION,
    DEFAULT_GEMINI_URL, DEFAULT_QDRANT_URL, EmbeddingConfig, GenerationConfig, IndexingConfig,
    ServerConfig, VectorStoreConfig,
};
pub use document::{
    Chunk, ChunkMetadata, DeleteOutcome, IngestReport, ScoredDocument, StoredDocument, StoredPoint,
};
pub use query::{
    GenerateRequest, GenerateResponse, GenerationParams, IngestDocument, IngestRequest,
    RetrieveRequest, RetrieveResponse, RetrievedDoc, StatusResponse,
};
