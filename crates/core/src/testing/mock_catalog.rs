//! Mock metadata catalog for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{CatalogError, MediaMeta, MetadataCatalog};
use crate::searcher::MediaKind;

/// Mock implementation of the MetadataCatalog trait.
///
/// Search matches titles case-insensitively against the configured entries.
#[derive(Debug, Default)]
pub struct MockCatalog {
    entries: Arc<RwLock<Vec<MediaMeta>>>,
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_entry(&self, meta: MediaMeta) {
        self.entries.write().await.push(meta);
    }

    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl MetadataCatalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<MediaMeta>, CatalogError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        let needle = query.to_lowercase();
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|m| m.kind == kind && m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn meta(&self, imdb_id: &str, kind: MediaKind) -> Result<MediaMeta, CatalogError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        self.entries
            .read()
            .await
            .iter()
            .find(|m| m.imdb_id == imdb_id && m.kind == kind)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(imdb_id.to_string()))
    }
}
