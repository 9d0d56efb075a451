//! Embedding client for the Gemini embedContent API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Converts text into fixed-length vectors.
///
/// Implementations must return exactly one vector per input or fail; partial
/// results are never surfaced. Rate-limit/quota failures are classified as
/// [`EmbeddingError::QuotaExhausted`] so callers can stop batch runs.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_bulk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Request body for the `:embedContent` endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    content: ContentParts<'a>,
    output_dimensionality: u64,
}

/// Request body for the `:batchEmbedContents` endpoint.
#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<BatchEmbedEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEmbedEntry<'a> {
    model: String,
    content: ContentParts<'a>,
    output_dimensionality: u64,
}

#[derive(Debug, Serialize)]
struct ContentParts<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

impl<'a> ContentParts<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            parts: vec![TextPart { text }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Option<Vec<EmbeddingValues>>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

/// Client for the external embedding provider.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    dimension: u64,
    api_key: String,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| EmbeddingError::ConnectionError("missing API key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            api_key,
        })
    }

    /// Configured output dimension of the vectors this client produces.
    pub fn dimension(&self) -> u64 {
        self.dimension
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url, self.model, method
        )
    }

    async fn post_json<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<reqwest::Response, EmbeddingError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, body))
    }
}

/// 429s and quota-exhausted bodies get their own variant; everything else is
/// a generic provider failure.
fn classify_failure(status: StatusCode, body: String) -> EmbeddingError {
    let message = format!("status {}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS
        || body.contains("RESOURCE_EXHAUSTED")
        || body.to_lowercase().contains("quota")
    {
        EmbeddingError::QuotaExhausted(message)
    } else {
        EmbeddingError::ProviderError(message)
    }
}

fn vector_from_response(response: EmbedResponse) -> Result<Vec<f32>, EmbeddingError> {
    match response.embedding {
        Some(embedding) if !embedding.values.is_empty() => Ok(embedding.values),
        _ => Err(EmbeddingError::InvalidResponse(
            "no embedding values returned".to_string(),
        )),
    }
}

fn vectors_from_response(
    response: BatchEmbedResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let embeddings = response.embeddings.ok_or_else(|| {
        EmbeddingError::InvalidResponse("no embeddings returned".to_string())
    })?;

    if embeddings.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "provider returned {} embeddings for {} inputs",
            embeddings.len(),
            expected
        )));
    }
    if embeddings.iter().any(|e| e.values.is_empty()) {
        return Err(EmbeddingError::InvalidResponse(
            "provider returned an empty embedding".to_string(),
        ));
    }

    Ok(embeddings.into_iter().map(|e| e.values).collect())
}

#[async_trait]
impl TextEmbedder for EmbeddingClient {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbedRequest {
            content: ContentParts::new(text),
            output_dimensionality: self.dimension,
        };

        let response = self
            .post_json(&self.endpoint("embedContent"), &request)
            .await?;

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        vector_from_response(parsed)
    }

    async fn embed_bulk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| BatchEmbedEntry {
                    model: format!("models/{}", self.model),
                    content: ContentParts::new(text),
                    output_dimensionality: self.dimension,
                })
                .collect(),
        };

        let response = self
            .post_json(&self.endpoint("batchEmbedContents"), &request)
            .await?;

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        vectors_from_response(parsed, texts.len())
    }
}
