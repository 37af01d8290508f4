//! Live download progress, published per job on a broadcast hub.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::{EngineError, JobHandle, JobStats, TorrentEngine};

/// Progress snapshot of one streaming job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub identifier: String,
    pub info_hash: String,
    /// Bytes per second.
    pub download_speed: u64,
    /// Fraction in `0.0..=1.0`.
    pub progress: f64,
    pub num_peers: u32,
    pub downloaded: u64,
    pub length: u64,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl ProgressEvent {
    pub fn from_stats(identifier: &str, info_hash: &str, stats: &JobStats) -> Self {
        Self {
            identifier: identifier.to_string(),
            info_hash: info_hash.to_string(),
            download_speed: stats.download_speed,
            progress: stats.progress(),
            num_peers: stats.num_peers,
            downloaded: stats.downloaded,
            length: stats.length,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Fan-out of progress events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ProgressHub {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressHub {
    /// Create a new hub with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ProgressEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Spawn the reporter for one job.
///
/// Publishes at most one event per `interval` until `cancel` fires or the
/// engine no longer knows the job.
pub fn spawn_reporter(
    engine: Arc<dyn TorrentEngine>,
    hub: ProgressHub,
    identifier: String,
    job: JobHandle,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match engine.stats(&job).await {
                Ok(stats) => {
                    hub.publish(ProgressEvent::from_stats(&identifier, &job.info_hash, &stats));
                }
                Err(EngineError::NotFound(_)) => {
                    debug!(hash = %job.info_hash, "Job gone, stopping progress reporter");
                    break;
                }
                Err(e) => {
                    warn!(hash = %job.info_hash, error = %e, "Failed to read job stats");
                }
            }
        }

        debug!(hash = %job.info_hash, "Progress reporter stopped");
    })
}
