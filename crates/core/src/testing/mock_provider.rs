//! Mock torrent provider for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::{ProviderError, ProviderKind, SourceQuery, SourceRecord, TorrentProvider};

type AcceptFilter = Box<dyn Fn(&SourceQuery) -> bool + Send + Sync>;

/// Mock implementation of the TorrentProvider trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable raw records
/// - Record queries for assertions
/// - Simulate failures and panics
/// - Decline queries through a predicate
///
/// # Example
///
/// ```rust,ignore
/// use cinebridge_core::testing::{fixtures, MockProvider};
///
/// let provider = MockProvider::new(ProviderKind::PirateBay);
/// provider.set_records(vec![fixtures::piratebay_record("Dune 2021 1080p", 'a', 10)]).await;
///
/// let records = provider.fetch(&SourceQuery::new("dune")).await?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(provider.call_count().await, 1);
/// ```
pub struct MockProvider {
    kind: ProviderKind,
    records: Arc<RwLock<Vec<SourceRecord>>>,
    queries: Arc<RwLock<Vec<SourceQuery>>>,
    next_error: Arc<RwLock<Option<String>>>,
    panic: Arc<RwLock<bool>>,
    declines: Option<AcceptFilter>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("kind", &self.kind)
            .field("declines", &self.declines.is_some())
            .finish()
    }
}

impl MockProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            records: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            panic: Arc::new(RwLock::new(false)),
            declines: None,
        }
    }

    /// Decline every query matching `predicate`.
    pub fn declining(mut self, predicate: impl Fn(&SourceQuery) -> bool + Send + Sync + 'static) -> Self {
        self.declines = Some(Box::new(predicate));
        self
    }

    pub async fn set_records(&self, records: Vec<SourceRecord>) {
        *self.records.write().await = records;
    }

    /// Configure the next fetch to fail with an API error.
    pub async fn set_next_error(&self, message: &str) {
        *self.next_error.write().await = Some(message.to_string());
    }

    /// Make every fetch panic.
    pub async fn set_panic(&self, panic: bool) {
        *self.panic.write().await = panic;
    }

    pub async fn call_count(&self) -> usize {
        self.queries.read().await.len()
    }

    pub async fn recorded_queries(&self) -> Vec<SourceQuery> {
        self.queries.read().await.clone()
    }
}

#[async_trait]
impl TorrentProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn accepts(&self, query: &SourceQuery) -> bool {
        !self.declines.as_ref().is_some_and(|declines| declines(query))
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, ProviderError> {
        self.queries.write().await.push(query.clone());

        if *self.panic.read().await {
            panic!("mock provider {} panicked", self.kind);
        }
        if let Some(message) = self.next_error.write().await.take() {
            return Err(ProviderError::ApiError(message));
        }
        Ok(self.records.read().await.clone())
    }
}
