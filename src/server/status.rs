//! In-process status record shared between the ingest and status endpoints.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::StatusResponse;
use crate::utils::format_uptime;

/// Uptime and last-indexed timestamp, written by ingestion and read by the
/// status endpoint. Injected into handlers rather than held as a global;
/// writes are last-writer-wins.
#[derive(Clone)]
pub struct StatusTracker {
    inner: Arc<Inner>,
}

struct Inner {
    started: Instant,
    last_indexed: RwLock<Option<DateTime<Utc>>>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                started: Instant::now(),
                last_indexed: RwLock::new(None),
            }),
        }
    }

    /// Record that an ingestion just completed.
    pub async fn mark_indexed(&self) {
        *self.inner.last_indexed.write().await = Some(Utc::now());
    }

    pub async fn snapshot(&self) -> StatusResponse {
        let last_indexed = *self.inner.last_indexed.read().await;
        let last_indexed = last_indexed.map(|ts| ts.to_rfc3339());

        StatusResponse {
            uptime: format_uptime(self.inner.started.elapsed()),
            status: "healthy".to_string(),
            last_indexed,
        }
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
