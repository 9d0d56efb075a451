//! Route handlers for the JSON REST surface.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;

use crate::error::{ApiError, PdfError};
use crate::models::{
    Chunk, DeleteOutcome, GenerateRequest, GenerateResponse, IngestReport, IngestRequest,
    RetrieveRequest, RetrieveResponse, StatusResponse, StoredDocument,
};
use crate::services::RetrieveError;

use super::AppState;

/// Maximum accepted upload size in bytes.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// `POST /documents/ingest`.
///
/// Accepts either a multipart PDF upload (field `file`) or a JSON body of
/// pre-chunked documents, and runs the ingestion pipeline over the
/// resulting chunks.
pub async fn ingest_documents(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<IngestReport>, ApiError> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let chunks = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::Validation(format!("invalid multipart body: {}", e)))?;
        chunks_from_upload(&state, multipart).await?
    } else {
        let bytes = axum::body::to_bytes(request.into_body(), MAX_UPLOAD_BYTES)
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read request body: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::Validation("no file or body provided".to_string()));
        }
        let body: IngestRequest = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Validation(format!("invalid ingest body: {}", e)))?;
        chunks_from_body(body)?
    };

    let report = state
        .pipeline
        .ingest(&chunks, state.batch_size, 0)
        .await;

    if report.ingested_count > 0 {
        state.status.mark_indexed().await;
    }
    tracing::info!(
        ingested = report.ingested_count,
        failed_batches = report.errors.len(),
        "ingest finished"
    );

    Ok(Json(report))
}

/// Extract and chunk an uploaded PDF page by page.
async fn chunks_from_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<Vec<Chunk>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::Validation("no file provided".to_string()))?;

    // PDF parsing is CPU-bound; keep it off the async workers.
    let document = tokio::task::spawn_blocking(move || {
        crate::services::extract_pdf(&bytes, &file_name)
    })
    .await
    .map_err(|e| ApiError::Pdf(PdfError::ParseError(format!("extraction task failed: {}", e))))??;

    let mut chunks = Vec::new();
    for page in &document.pages {
        chunks.extend(state.chunker.chunk_page(
            &page.text,
            page.page,
            document.total_pages,
            &document.info,
        ));
    }

    if chunks.is_empty() {
        return Err(ApiError::Validation(
            "document contains no extractable text".to_string(),
        ));
    }

    Ok(chunks)
}

/// Accept pre-chunked documents from the JSON body variant.
fn chunks_from_body(body: IngestRequest) -> Result<Vec<Chunk>, ApiError> {
    if body.documents.is_empty() {
        return Err(ApiError::Validation("no documents provided".to_string()));
    }

    Ok(body
        .documents
        .into_iter()
        .map(|doc| Chunk {
            text: doc.content,
            metadata: doc.metadata,
        })
        .collect())
}

/// `GET /documents/{id}`.
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StoredDocument>, ApiError> {
    match state.store.get_by_id(&id).await? {
        Some(document) => Ok(Json(document)),
        None => Err(ApiError::NotFound(format!("document {} not found", id))),
    }
}

/// `DELETE /documents/{id}`. Always 200; store failures surface in the body.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<DeleteOutcome> {
    Json(state.store.delete_by_id(&id).await)
}

/// `POST /query/retrieve`.
pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".to_string()));
    }

    let documents = state
        .query
        .retrieve(&request.query, request.top_k)
        .await
        .map_err(|e| match e {
            RetrieveError::Embedding(e) => ApiError::Embedding(e),
            RetrieveError::Store(e) => ApiError::Store(e),
        })?;

    Ok(Json(RetrieveResponse { documents }))
}

/// `POST /query/generate`.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".to_string()));
    }

    let response = state
        .query
        .generate(
            &request.query,
            &request.retrieved_docs,
            request.generation_params.as_ref(),
        )
        .await?;

    Ok(Json(response))
}

/// `GET /status`.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.status.snapshot().await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;

    use super::*;
    use crate::error::{EmbeddingError, GenerationError, StoreError};
    use crate::models::{
        ChunkMetadata, GenerationParams, RetrievedDoc, ScoredDocument, StoredPoint,
    };
    use crate::server::StatusTracker;
    use crate::services::{
        AnswerGenerator, CollectionInfo, IngestPipeline, QueryService, TextChunker, TextEmbedder,
        VectorIndex,
    };

    struct FakeEmbedder;

    #[async_trait]
    impl TextEmbedder for FakeEmbedder {
        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![0.5; 4])
        }

        async fn embed_bulk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
        }
    }

    /// Store with a single known document.
    struct FakeStore;

    const KNOWN_ID: &str = "2c4b0a52-30f5-4d2e-a9f4-8a2d3c6e1b7f";

    #[async_trait]
    impl VectorIndex for FakeStore {
        async fn ensure_collection(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn upsert_points(
            &self,
            _points: Vec<StoredPoint>,
            _wait: bool,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn search_similar(
            &self,
            _vector: Vec<f32>,
            _top_k: u64,
        ) -> Result<Vec<ScoredDocument>, StoreError> {
            Ok(vec![ScoredDocument {
                id: KNOWN_ID.to_string(),
                content: "retrograde motion".to_string(),
                metadata: ChunkMetadata::default(),
                score: 0.8,
            }])
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
            if id == KNOWN_ID {
                Ok(Some(StoredDocument {
                    id: id.to_string(),
                    content: "retrograde motion".to_string(),
                    metadata: ChunkMetadata::default(),
                }))
            } else {
                Ok(None)
            }
        }

        async fn delete_by_id(&self, id: &str) -> DeleteOutcome {
            if id == KNOWN_ID {
                DeleteOutcome {
                    deleted: true,
                    message: format!("document {} deleted", id),
                }
            } else {
                DeleteOutcome {
                    deleted: false,
                    message: "delete was not acknowledged by the store".to_string(),
                }
            }
        }

        async fn collection_info(&self) -> Result<Option<CollectionInfo>, StoreError> {
            Ok(Some(CollectionInfo { points_count: 1 }))
        }
    }

    struct FakeGenerator;

    #[async_trait]
    impl AnswerGenerator for FakeGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _params: Option<&GenerationParams>,
        ) -> Result<String, GenerationError> {
            Ok("as above, so below".to_string())
        }
    }

    fn test_state() -> AppState {
        let embedder = Arc::new(FakeEmbedder);
        let store: Arc<dyn VectorIndex> = Arc::new(FakeStore);
        let generator = Arc::new(FakeGenerator);
        AppState {
            chunker: TextChunker::new(1000, 200).unwrap(),
            pipeline: Arc::new(IngestPipeline::new(embedder.clone(), store.clone())),
            query: Arc::new(QueryService::new(embedder, store.clone(), generator)),
            store,
            status: StatusTracker::new(),
            batch_size: 2,
        }
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_json_body() {
        let state = test_state();
        let request = json_request(
            r#"{"documents": [
                {"content": "first chunk", "metadata": {"chunkId": 1, "page": 1}},
                {"content": "second chunk", "metadata": {"chunkId": 2, "page": 1}},
                {"content": "third chunk", "metadata": {"chunkId": 3, "page": 2}}
            ]}"#,
        );

        let Json(report) = ingest_documents(State(state.clone()), request).await.unwrap();

        assert_eq!(report.ingested_count, 3);
        assert!(report.errors.is_empty());
        // Successful ingest stamps the status record
        assert!(state.status.snapshot().await.last_indexed.is_some());
    }

    #[tokio::test]
    async fn test_ingest_empty_body_is_validation_error() {
        let state = test_state();
        let request = json_request("");
        let result = ingest_documents(State(state.clone()), request).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        let request = json_request(r#"{"documents": []}"#);
        let result = ingest_documents(State(state), request).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_get_document_found_and_missing() {
        let state = test_state();

        let Json(document) = get_document(State(state.clone()), Path(KNOWN_ID.to_string()))
            .await
            .unwrap();
        assert_eq!(document.id, KNOWN_ID);
        assert_eq!(document.content, "retrograde motion");

        let result = get_document(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_document_never_errors() {
        let state = test_state();

        let Json(outcome) = delete_document(State(state.clone()), Path(KNOWN_ID.to_string())).await;
        assert!(outcome.deleted);

        let Json(outcome) = delete_document(State(state), Path("missing".to_string())).await;
        assert!(!outcome.deleted);
        assert!(!outcome.message.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_rejects_blank_query() {
        let state = test_state();
        let request = RetrieveRequest {
            query: "   ".to_string(),
            top_k: None,
        };
        let result = retrieve(State(state), Json(request)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_retrieve_returns_documents() {
        let state = test_state();
        let request = RetrieveRequest {
            query: "why does mercury appear to move backwards".to_string(),
            top_k: Some(3),
        };
        let Json(response) = retrieve(State(state), Json(request)).await.unwrap();
        assert_eq!(response.documents.len(), 1);
        assert_eq!(response.documents[0].id, KNOWN_ID);
    }

    #[tokio::test]
    async fn test_generate_echoes_source_ids() {
        let state = test_state();
        let request = GenerateRequest {
            query: "explain retrogrades".to_string(),
            retrieved_docs: vec![
                RetrievedDoc {
                    id: KNOWN_ID.to_string(),
                    content: "retrograde motion".to_string(),
                },
                RetrievedDoc {
                    id: String::new(),
                    content: "unattributed".to_string(),
                },
            ],
            generation_params: None,
        };

        let Json(response) = generate(State(state), Json(request)).await.unwrap();
        assert_eq!(response.answer, "as above, so below");
        assert_eq!(response.source_documents, vec![KNOWN_ID.to_string()]);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let state = test_state();
        let Json(response) = status(State(state)).await;
        assert_eq!(response.status, "healthy");
        assert!(response.last_indexed.is_none());
    }
}
