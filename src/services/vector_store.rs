//! Qdrant vector store gateway.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, GetPointsBuilder, PointId,
    PointStruct, PointsIdsList, SearchPointsBuilder, UpdateStatus, UpsertPointsBuilder,
    VectorParamsBuilder,
};

use crate::error::StoreError;
use crate::models::{
    ChunkMetadata, DeleteOutcome, ScoredDocument, StoredDocument, StoredPoint, VectorStoreConfig,
};

/// Point count for the status surface.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Narrow contract the pipeline and handlers depend on; the Qdrant client
/// implements it in production and tests substitute in-process fakes.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection if absent. Idempotent; never destroys or
    /// resizes an existing collection.
    async fn ensure_collection(&self) -> Result<(), StoreError>;

    /// Batched write. With `wait` set the call returns only after the store
    /// acknowledges durability, not just acceptance.
    async fn upsert_points(&self, points: Vec<StoredPoint>, wait: bool) -> Result<(), StoreError>;

    /// At most `top_k` results ordered by descending similarity. An empty
    /// collection yields an empty list, not an error.
    async fn search_similar(
        &self,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ScoredDocument>, StoreError>;

    /// `None`, not an error, on miss.
    async fn get_by_id(&self, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Store-side failures are reported as `deleted: false` so callers can
    /// render a message without a crash path.
    async fn delete_by_id(&self, id: &str) -> DeleteOutcome;

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, StoreError>;
}

/// Qdrant-backed vector store.
pub struct VectorStoreClient {
    client: Qdrant,
    collection: String,
    dimension: u64,
}

impl VectorStoreClient {
    /// Create a client from configuration with the collection's embedding
    /// dimension. The dimension is fixed for the collection's lifetime;
    /// changing embedding size requires a new collection.
    pub fn new(config: &VectorStoreConfig, dimension: u64) -> Result<Self, StoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimension,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorIndex for VectorStoreClient {
    async fn ensure_collection(&self) -> Result<(), StoreError> {
        if self.collection_info().await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection)
            .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine));

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| StoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert_points(&self, points: Vec<StoredPoint>, wait: bool) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let payload = build_payload(&point.content, &point.metadata);
                PointStruct::new(point.id.to_string(), point.vector, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(wait);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| StoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search_similar(
        &self,
        vector: Vec<f32>,
        top_k: u64,
    ) -> Result<Vec<ScoredDocument>, StoreError> {
        let search = SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| StoreError::SearchError(e.to_string()))?;

        let documents = results
            .result
            .into_iter()
            .map(|point| ScoredDocument {
                id: point_id_string(point.id.as_ref()),
                content: payload_str(&point.payload, "content").unwrap_or_default(),
                metadata: metadata_from_payload(&point.payload),
                score: point.score,
            })
            .collect();

        Ok(documents)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let ids: Vec<PointId> = vec![id.to_string().into()];
        let get = GetPointsBuilder::new(&self.collection, ids)
            .with_payload(true)
            .with_vectors(false);

        let response = self
            .client
            .get_points(get)
            .await
            .map_err(|e| StoreError::RetrieveError(e.to_string()))?;

        Ok(response.result.into_iter().next().map(|point| StoredDocument {
            id: point_id_string(point.id.as_ref()),
            content: payload_str(&point.payload, "content").unwrap_or_default(),
            metadata: metadata_from_payload(&point.payload),
        }))
    }

    async fn delete_by_id(&self, id: &str) -> DeleteOutcome {
        let ids = PointsIdsList {
            ids: vec![id.to_string().into()],
        };
        let delete = DeletePointsBuilder::new(&self.collection)
            .points(ids)
            .wait(true);

        match self.client.delete_points(delete).await {
            Ok(response) => {
                let completed = response
                    .result
                    .map(|r| r.status() == UpdateStatus::Completed)
                    .unwrap_or(false);
                if completed {
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
            Err(e) => DeleteOutcome {
                deleted: false,
                message: format!("delete failed: {}", e),
            },
        }
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, StoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(CollectionInfo {
                points_count: info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            })),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(StoreError::CollectionError(msg))
                }
            }
        }
    }
}

type Payload = HashMap<String, qdrant_client::qdrant::Value>;

fn build_payload(content: &str, metadata: &ChunkMetadata) -> Payload {
    let mut payload: Payload = HashMap::new();
    payload.insert("content".to_string(), content.to_string().into());
    payload.insert("chunk_id".to_string(), i64::from(metadata.chunk_id).into());
    payload.insert("page".to_string(), i64::from(metadata.page).into());
    payload.insert("file_name".to_string(), metadata.file_name.clone().into());
    payload.insert(
        "total_pages".to_string(),
        i64::from(metadata.total_pages).into(),
    );

    if let Some(ref title) = metadata.title {
        payload.insert("title".to_string(), title.clone().into());
    }
    if let Some(ref author) = metadata.author {
        payload.insert("author".to_string(), author.clone().into());
    }
    if let Some(ref keywords) = metadata.keywords {
        payload.insert("keywords".to_string(), keywords.clone().into());
    }
    if let Some(ref created_at) = metadata.created_at {
        payload.insert("created_at".to_string(), created_at.clone().into());
    }
    if let Some(ref modified_at) = metadata.modified_at {
        payload.insert("modified_at".to_string(), modified_at.clone().into());
    }

    payload
}

fn metadata_from_payload(payload: &Payload) -> ChunkMetadata {
    ChunkMetadata {
        chunk_id: payload_u32(payload, "chunk_id").unwrap_or_default(),
        page: payload_u32(payload, "page").unwrap_or_default(),
        file_name: payload_str(payload, "file_name").unwrap_or_default(),
        title: payload_str(payload, "title"),
        author: payload_str(payload, "author"),
        keywords: payload_str(payload, "keywords"),
        created_at: payload_str(payload, "created_at"),
        modified_at: payload_str(payload, "modified_at"),
        total_pages: payload_u32(payload, "total_pages").unwrap_or_default(),
    }
}

fn payload_str(payload: &Payload, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

fn payload_u32(payload: &Payload, key: &str) -> Option<u32> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(qdrant_client::qdrant::value::Kind::IntegerValue(n)) => u32::try_from(*n).ok(),
        _ => None,
    })
}

fn point_id_string(id: Option<&PointId>) -> String {
    match id {
        Some(id) => match &id.point_id_options {
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid.clone(),
            Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => num.to_string(),
            None => String::new(),
        },
        None => String::new(),
    }
}
