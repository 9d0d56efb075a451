//! Batched document ingestion: embed chunks, accumulate points, single
//! upsert.

use std::sync::Arc;

use crate::models::{Chunk, IngestReport, StoredPoint};
use crate::services::embedding::TextEmbedder;
use crate::services::vector_store::VectorIndex;
use crate::utils::content_preview;

/// Orchestrates chunker output through the embedder into the vector store.
pub struct IngestPipeline {
    embedder: Arc<dyn TextEmbedder>,
    store: Arc<dyn VectorIndex>,
}

impl IngestPipeline {
    pub fn new(embedder: Arc<dyn TextEmbedder>, store: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, store }
    }

    /// Ingest `chunks[start_at..]` in batches of `batch_size`.
    ///
    /// Embedding failures are isolated per batch: a failing batch is
    /// recorded and processing continues, except on quota exhaustion where
    /// the remaining batches are abandoned immediately. Successfully
    /// embedded batches accumulate into a single upsert issued once at the
    /// end with `wait=true`; a store failure at that point discards the
    /// whole attempt and reports zero ingested. Batch indices in the error
    /// list are absolute (offset by `start_at`).
    pub async fn ingest(
        &self,
        chunks: &[Chunk],
        batch_size: usize,
        start_at: usize,
    ) -> IngestReport {
        let mut points: Vec<StoredPoint> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        let remaining = if start_at < chunks.len() {
            &chunks[start_at..]
        } else {
            &[]
        };
        let batch_size = batch_size.max(1);

        for (batch_index, batch) in remaining.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();

            match self.embedder.embed_bulk(&texts).await {
                Ok(vectors) => {
                    points.extend(
                        batch
                            .iter()
                            .zip(vectors)
                            .map(|(chunk, vector)| StoredPoint::from_chunk(chunk, vector)),
                    );
                }
                Err(e) => {
                    let quota = e.is_quota();
                    errors.push(format!(
                        "batch {} ({}): {}",
                        start_at + batch_index,
                        content_preview(&texts.first().cloned().unwrap_or_default()),
                        e
                    ));
                    if quota {
                        tracing::warn!(
                            batch = start_at + batch_index,
                            "quota exhausted, abandoning remaining batches"
                        );
                        break;
                    }
                }
            }
        }

        if points.is_empty() {
            return IngestReport {
                ingested_count: 0,
                errors,
            };
        }

        let accumulated = points.len();
        match self.store.upsert_points(points, true).await {
            Ok(()) => IngestReport {
                ingested_count: accumulated,
                errors,
            },
            Err(e) => {
                // All-or-nothing final write: nothing landed.
                errors.push(format!("upsert failed: {}", e));
                IngestReport {
                    ingested_count: 0,
                    errors,
                }
            }
        }
    }
}
