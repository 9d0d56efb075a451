//! Request and response bodies for the query surface.

use serde::{Deserialize, Serialize};

use super::document::ScoredDocument;

/// Body of `POST /query/retrieve`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    pub query: String,

    #[serde(default)]
    pub top_k: Option<u64>,
}

/// Response of `POST /query/retrieve`.
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResponse {
    pub documents: Vec<ScoredDocument>,
}

/// A document handed back to `POST /query/generate` as context.
///
/// Only the id and content matter for generation; ids may be empty when the
/// caller assembled context from untracked sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDoc {
    #[serde(default)]
    pub id: String,

    pub content: String,
}

/// Optional decoding parameters forwarded to the generation provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Body of `POST /query/generate`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub query: String,

    #[serde(default)]
    pub retrieved_docs: Vec<RetrievedDoc>,

    #[serde(default)]
    pub generation_params: Option<GenerationParams>,
}

/// Response of `POST /query/generate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub answer: String,
    pub source_documents: Vec<String>,
}

/// Body of the JSON variant of `POST /documents/ingest`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub documents: Vec<IngestDocument>,
}

/// One pre-chunked document supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocument {
    pub content: String,

    #[serde(default)]
    pub metadata: super::document::ChunkMetadata,
}

/// Response of `GET /status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub uptime: String,
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<String>,
}
