//! Mock subtitle backend for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::subtitles::{
    SubtitleError, SubtitleProvider, SubtitleProviderKind, SubtitleQuery, SubtitleTrack,
};

#[derive(Debug)]
pub struct MockSubtitleProvider {
    kind: SubtitleProviderKind,
    tracks: Arc<RwLock<Vec<SubtitleTrack>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockSubtitleProvider {
    pub fn new(kind: SubtitleProviderKind) -> Self {
        Self {
            kind,
            tracks: Arc::new(RwLock::new(Vec::new())),
            fail: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn set_tracks(&self, tracks: Vec<SubtitleTrack>) {
        *self.tracks.write().await = tracks;
    }

    /// Make every search fail.
    pub async fn set_failing(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl SubtitleProvider for MockSubtitleProvider {
    fn kind(&self) -> SubtitleProviderKind {
        self.kind
    }

    async fn search(&self, query: &SubtitleQuery) -> Result<Vec<SubtitleTrack>, SubtitleError> {
        if *self.fail.read().await {
            return Err(SubtitleError::ApiError {
                status: 503,
                message: "mock outage".to_string(),
            });
        }
        Ok(self
            .tracks
            .read()
            .await
            .iter()
            .filter(|t| query.wants(&t.language))
            .cloned()
            .collect())
    }
}
