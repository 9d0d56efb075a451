//! Query orchestration: embed, search, and answer generation.

use std::sync::Arc;

use crate::error::{EmbeddingError, GenerationError, StoreError};
use crate::models::{GenerateResponse, GenerationParams, RetrievedDoc, ScoredDocument};
use crate::services::embedding::TextEmbedder;
use crate::services::generation::AnswerGenerator;
use crate::services::vector_store::VectorIndex;

/// Results returned when the caller does not specify `topK`.
pub const DEFAULT_TOP_K: u64 = 5;

/// Errors surfaced by the retrieval path.
#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Embeds queries, searches the store, and delegates answer generation.
pub struct QueryService {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
}

impl QueryService {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            embedder,
            store,
            generator,
        }
    }

    /// Embed the query and return the `top_k` most similar stored documents.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: Option<u64>,
    ) -> Result<Vec<ScoredDocument>, RetrieveError> {
        let vector = self.embedder.embed_one(query).await?;
        let documents = self
            .store
            .search_similar(vector, top_k.unwrap_or(DEFAULT_TOP_K))
            .await?;
        Ok(documents)
    }

    /// Compose the retrieved documents into a context block, fill the prompt
    /// template, and return the provider's answer verbatim together with the
    /// ids of the documents that were supplied as context.
    ///
    /// The ids are echoed, not verified; the model is free to ignore the
    /// context.
    pub async fn generate(
        &self,
        query: &str,
        retrieved_docs: &[RetrievedDoc],
        params: Option<&GenerationParams>,
    ) -> Result<GenerateResponse, GenerationError> {
        let prompt = build_prompt(query, retrieved_docs);
        let answer = self.generator.generate(&prompt, params).await?;

        let source_documents = retrieved_docs
            .iter()
            .map(|doc| doc.id.clone())
            .filter(|id| !id.is_empty())
            .collect();

        Ok(GenerateResponse {
            answer,
            source_documents,
        })
    }
}

/// Fixed prompt template: document contents joined by blank lines, then the
/// raw question.
fn build_prompt(query: &str, docs: &[RetrievedDoc]) -> String {
    let context = docs
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Answer the question based only on the following context: {} \n Question: {}",
        context, query
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{ChunkMetadata, DeleteOutcome, StoredDocument, StoredPoint};
    use crate::services::vector_store::CollectionInfo;

    struct FixedEmbedder;

    #[async_trait]
    impl TextEmbedder for FixedEmbedder {
        async fn embed_one(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_bulk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    struct RecordingIndex {
        searches: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
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
            top_k: u64,
        ) -> Result<Vec<ScoredDocument>, StoreError> {
            self.searches.lock().unwrap().push(top_k);
            Ok(vec![ScoredDocument {
                id: "doc-1".to_string(),
                content: "saturn returns".to_string(),
                metadata: ChunkMetadata::default(),
                score: 0.9,
            }])
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<StoredDocument>, StoreError> {
            Ok(None)
        }

        async fn delete_by_id(&self, _id: &str) -> DeleteOutcome {
            DeleteOutcome {
                deleted: false,
                message: String::new(),
            }
        }

        async fn collection_info(&self) -> Result<Option<CollectionInfo>, StoreError> {
            Ok(None)
        }
    }

    struct EchoGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        async fn generate(
            &self,
            prompt: &str,
            _params: Option<&GenerationParams>,
        ) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("the answer".to_string())
        }
    }

    fn service() -> (QueryService, Arc<RecordingIndex>, Arc<EchoGenerator>) {
        let index = Arc::new(RecordingIndex {
            searches: Mutex::new(Vec::new()),
        });
        let generator = Arc::new(EchoGenerator {
            prompts: Mutex::new(Vec::new()),
        });
        (
            QueryService::new(Arc::new(FixedEmbedder), index.clone(), generator.clone()),
            index,
            generator,
        )
    }

    #[tokio::test]
    async fn test_retrieve_defaults_top_k() {
        let (service, index, _) = service();

        let docs = service.retrieve("what is a trine", None).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(index.searches.lock().unwrap().as_slice(), &[DEFAULT_TOP_K]);

        service.retrieve("what is a trine", Some(3)).await.unwrap();
        assert_eq!(index.searches.lock().unwrap().as_slice(), &[5, 3]);
    }

    #[tokio::test]
    async fn test_generate_builds_prompt_and_echoes_ids() {
        let (service, _, generator) = service();

        let docs = vec![
            RetrievedDoc {
                id: "a".to_string(),
                content: "first".to_string(),
            },
            RetrievedDoc {
                id: String::new(),
                content: "second".to_string(),
            },
            RetrievedDoc {
                id: "c".to_string(),
                content: "third".to_string(),
            },
        ];

        let response = service.generate("why", &docs, None).await.unwrap();

        assert_eq!(response.answer, "the answer");
        // Empty ids are filtered out
        assert_eq!(response.source_documents, vec!["a", "c"]);

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("first\n\nsecond\n\nthird"));
        assert!(prompts[0].contains("Question: why"));
    }

    #[test]
    fn test_build_prompt_template() {
        let docs = vec![RetrievedDoc {
            id: "x".to_string(),
            content: "ctx".to_string(),
        }];
        assert_eq!(
            build_prompt("q", &docs),
            "Answer the question based only on the following context: ctx \n Question: q"
        );
    }

    #[test]
    fn test_build_prompt_no_docs() {
        assert_eq!(
            build_prompt("q", &[]),
            "Answer the question based only on the following context:  \n Question: q"
        );
    }
}
