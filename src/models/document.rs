use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded segment of source-document text with provenance metadata.
///
/// Chunks are immutable once produced by the chunker; ordering within a
/// document is (page, chunk_id) ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Provenance metadata carried by every chunk so results can be traced back
/// to their source page and document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// 1-based sequence id of the chunk within its page.
    #[serde(default)]
    pub chunk_id: u32,

    /// 1-based source page number.
    #[serde(default)]
    pub page: u32,

    #[serde(default)]
    pub file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,

    #[serde(default)]
    pub total_pages: u32,
}

/// One stored vector plus its payload, owned by the vector store once
/// upserted. The id is generated at ingestion time unless supplied.
#[derive(Debug, Clone)]
pub struct StoredPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl StoredPoint {
    /// Build a point from an embedded chunk with a fresh random id.
    pub fn from_chunk(chunk: &Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vector,
            content: chunk.text.clone(),
            metadata: chunk.metadata.clone(),
        }
    }
}

/// Read-back projection of a stored point, without the vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// A search-result projection of a stored point plus a similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub score: f32,
}

/// Per-call ingestion outcome: how many points landed and which batches
/// failed, with a human-readable reason per failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub ingested_count: usize,
    pub errors: Vec<String>,
}

/// Outcome of a delete-by-id call. A store-side failure is reported as
/// `deleted: false` rather than an error so callers can render a message
/// without a crash path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chunk() -> Chunk {
        Chunk {
            text: "the moon is in the seventh house".to_string(),
            metadata: ChunkMetadata {
                chunk_id: 1,
                page: 2,
                file_name: "almanac.pdf".to_string(),
                title: Some("Almanac".to_string()),
                total_pages: 10,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_point_from_chunk() {
        let chunk = sample_chunk();
        let point = StoredPoint::from_chunk(&chunk, vec![0.1, 0.2]);
        assert_eq!(point.content, chunk.text);
        assert_eq!(point.metadata, chunk.metadata);
        assert_eq!(point.vector.len(), 2);

        let other = StoredPoint::from_chunk(&chunk, vec![0.1, 0.2]);
        assert_ne!(point.id, other.id);
    }

    #[test]
    fn test_ingest_report_serialization() {
        let report = IngestReport {
            ingested_count: 5,
            errors: vec!["batch 2: quota".to_string()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["ingestedCount"], 5);
        assert_eq!(json["errors"][0], "batch 2: quota");
    }

    #[test]
    fn test_metadata_camel_case() {
        let metadata = sample_chunk().metadata;
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["chunkId"], 1);
        assert_eq!(json["fileName"], "almanac.pdf");
        assert_eq!(json["totalPages"], 10);
        // Absent optionals are omitted entirely
        assert!(json.get("author").is_none());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let metadata = sample_chunk().metadata;
        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: ChunkMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }
}
