//! Concurrent fan-out across providers, then filter, score, dedup and rank.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::metrics;

use super::dedup::dedup_and_rank;
use super::filter::{is_nsfw, score};
use super::{SourceQuery, TorrentCandidate, TorrentProvider};

/// Aggregates torrent sources from a fixed, ordered provider list.
pub struct SourceAggregator {
    providers: Vec<Arc<dyn TorrentProvider>>,
}

impl SourceAggregator {
    pub fn new(providers: Vec<Arc<dyn TorrentProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn TorrentProvider>] {
        &self.providers
    }

    /// Ranked, filtered, de-duplicated candidates for `query`.
    ///
    /// Never fails: a provider that errors, times out or panics contributes
    /// nothing. An empty query makes no network call.
    pub async fn ranked_sources(&self, query: &SourceQuery) -> Vec<TorrentCandidate> {
        if query.query.trim().is_empty() {
            debug!("Empty query, skipping provider fan-out");
            return Vec::new();
        }

        let tasks: Vec<_> = self
            .providers
            .iter()
            .filter(|p| {
                let accepted = p.accepts(query);
                if !accepted {
                    metrics::PROVIDER_REQUESTS
                        .with_label_values(&[p.kind().as_str(), "skipped"])
                        .inc();
                }
                accepted
            })
            .map(|p| search_provider(p.as_ref(), query))
            .collect();

        debug!(
            providers = tasks.len(),
            query = %query.query,
            "Starting parallel source search"
        );

        // join_all keeps task-list order regardless of completion order
        let merged: Vec<TorrentCandidate> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .flatten()
            .collect();

        let total = merged.len();
        let mut kept: Vec<TorrentCandidate> = merged.into_iter().filter(|c| !is_nsfw(c)).collect();
        let filtered = total - kept.len();
        if filtered > 0 {
            metrics::NSFW_FILTERED.inc_by(filtered as u64);
        }

        for candidate in &mut kept {
            candidate.score = score(candidate);
        }

        let ranked = dedup_and_rank(kept);

        metrics::SEARCH_RESULTS
            .with_label_values(&[])
            .observe(ranked.len() as f64);
        debug!(
            raw = total,
            filtered = filtered,
            results = ranked.len(),
            "Source search complete"
        );

        ranked
    }
}

/// Run one provider to completion, converting every failure into an empty list.
async fn search_provider(provider: &dyn TorrentProvider, query: &SourceQuery) -> Vec<TorrentCandidate> {
    let kind = provider.kind();
    let start = Instant::now();

    let outcome = AssertUnwindSafe(provider.fetch(query)).catch_unwind().await;

    metrics::PROVIDER_DURATION
        .with_label_values(&[kind.as_str()])
        .observe(start.elapsed().as_secs_f64());

    match outcome {
        Ok(Ok(records)) => {
            let candidates: Vec<_> = records.into_iter().flat_map(|r| r.normalize()).collect();
            metrics::PROVIDER_REQUESTS
                .with_label_values(&[kind.as_str(), "success"])
                .inc();
            debug!(provider = %kind, results = candidates.len(), "Provider search complete");
            candidates
        }
        Ok(Err(e)) => {
            metrics::PROVIDER_REQUESTS
                .with_label_values(&[kind.as_str(), "error"])
                .inc();
            warn!(provider = %kind, error = %e, "Provider search failed");
            Vec::new()
        }
        Err(_) => {
            metrics::PROVIDER_REQUESTS
                .with_label_values(&[kind.as_str(), "panic"])
                .inc();
            warn!(provider = %kind, "Provider search panicked");
            Vec::new()
        }
    }
}
