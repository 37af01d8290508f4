//! Streaming session manager.
//!
//! Maps magnet identifiers to engine jobs and local file endpoints. At most
//! one identifier is active: starting another tears the previous session
//! down. The session table lock is never held across an engine or network
//! await; every await in `start` is followed by a check that the identifier
//! is still the active one.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::endpoint::StreamEndpoint;
use super::progress::{spawn_reporter, ProgressEvent, ProgressHub};
use super::selection::{select_file, Selection};
use super::{FileChoice, SessionInfo, SessionStatus, StartOutcome, StreamError};
use crate::config::StreamConfig;
use crate::engine::{EngineError, JobHandle, TorrentEngine};
use crate::metrics::STREAM_STARTS;
use crate::searcher::magnet::info_hash_from_magnet;

struct Reporter {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Reporter {
    fn stop(self) {
        self.cancel.cancel();
        drop(self.task);
    }
}

struct SessionEntry {
    status: SessionStatus,
    job: Option<JobHandle>,
    endpoint: Option<StreamEndpoint>,
    reporter: Option<Reporter>,
}

impl SessionEntry {
    fn pending() -> Self {
        Self {
            status: SessionStatus::Pending,
            job: None,
            endpoint: None,
            reporter: None,
        }
    }

    fn info(&self, identifier: &str) -> SessionInfo {
        SessionInfo {
            identifier: identifier.to_string(),
            status: self.status,
            info_hash: self
                .job
                .as_ref()
                .map(|j| j.info_hash.clone())
                .or_else(|| info_hash_from_magnet(identifier)),
            url: self.endpoint.as_ref().map(|e| e.url().to_string()),
            file: self.endpoint.as_ref().map(|e| e.file().clone()),
        }
    }

    fn ready_outcome(&self, hint: Option<usize>) -> Option<StartOutcome> {
        let endpoint = self.endpoint.as_ref()?;
        if hint.is_some_and(|index| index != endpoint.file().index) {
            return None;
        }
        Some(StartOutcome::Ready {
            url: endpoint.url().to_string(),
            file: endpoint.file().clone(),
        })
    }
}

#[derive(Default)]
struct SessionTable {
    sessions: HashMap<String, SessionEntry>,
    active: Option<String>,
}

impl SessionTable {
    fn is_active(&self, identifier: &str) -> bool {
        self.active.as_deref() == Some(identifier)
    }
}

/// Owns every streaming session of the process.
pub struct SessionManager {
    engine: Arc<dyn TorrentEngine>,
    hub: ProgressHub,
    host: IpAddr,
    progress_interval: Duration,
    table: Mutex<SessionTable>,
}

impl SessionManager {
    pub fn new(engine: Arc<dyn TorrentEngine>, hub: ProgressHub, config: &StreamConfig) -> Self {
        Self {
            engine,
            hub,
            host: config.host,
            progress_interval: Duration::from_millis(config.progress_interval_ms),
            table: Mutex::new(SessionTable::default()),
        }
    }

    pub fn engine(&self) -> &Arc<dyn TorrentEngine> {
        &self.engine
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.hub.subscribe()
    }

    /// Currently active session, if any.
    pub async fn active(&self) -> Option<SessionInfo> {
        let table = self.table.lock().await;
        let identifier = table.active.as_deref()?;
        Some(
            table
                .sessions
                .get(identifier)
                .map(|entry| entry.info(identifier))
                .unwrap_or_else(|| SessionEntry::pending().info(identifier)),
        )
    }

    /// Every session in the table.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let table = self.table.lock().await;
        table
            .sessions
            .iter()
            .map(|(id, entry)| entry.info(id))
            .collect()
    }

    /// Start (or resume) streaming `identifier`.
    pub async fn start(
        &self,
        identifier: &str,
        file_index_hint: Option<usize>,
    ) -> Result<StartOutcome, StreamError> {
        // Mark active before anything else can interleave.
        let previous = {
            let mut table = self.table.lock().await;
            let previous = table.active.replace(identifier.to_string());
            previous.filter(|p| p != identifier)
        };

        if let Some(previous) = previous {
            info!(previous = %previous, next = %identifier, "Replacing active stream");
            self.stop(&previous).await;
        }

        let stale_endpoint = {
            let mut table = self.table.lock().await;
            if !table.is_active(identifier) {
                return Err(self.superseded(identifier));
            }
            let entry = table
                .sessions
                .entry(identifier.to_string())
                .or_insert_with(SessionEntry::pending);

            if let Some(outcome) = entry.ready_outcome(file_index_hint) {
                STREAM_STARTS.with_label_values(&["resumed"]).inc();
                debug!(identifier = %identifier, "Resuming existing stream endpoint");
                return Ok(outcome);
            }
            // a different file was asked for
            entry.endpoint.take()
        };
        if let Some(endpoint) = stale_endpoint {
            endpoint.shutdown().await;
        }

        let job = match self.attach_or_add(identifier).await {
            Ok(job) => job,
            Err(e) => return Err(self.fail(identifier, e.into()).await),
        };

        {
            let mut table = self.table.lock().await;
            if !table.is_active(identifier) {
                drop(table);
                return Err(self.abandon(identifier, None).await);
            }
            if let Some(entry) = table.sessions.get_mut(identifier) {
                entry.job = Some(job.clone());
            }
        }

        let files = match self.engine.files(&job).await {
            Ok(files) => files,
            Err(e) => return Err(self.fail(identifier, e.into()).await),
        };

        let file = match select_file(&files, file_index_hint) {
            Ok(Selection::File(file)) => file,
            Ok(Selection::Choose(files)) => {
                STREAM_STARTS.with_label_values(&["select_file"]).inc();
                debug!(identifier = %identifier, files = files.len(), "Several playable files, asking caller");
                return Ok(StartOutcome::SelectFile { files });
            }
            Err(e) => return Err(self.fail(identifier, e).await),
        };

        let endpoint =
            match StreamEndpoint::bind(self.host, self.engine.clone(), job.clone(), file.clone())
                .await
            {
                Ok(endpoint) => endpoint,
                Err(e) => return Err(self.fail(identifier, e).await),
            };

        self.record_endpoint(identifier, job, file, endpoint).await
    }

    /// Find the engine job for `identifier`, adding the magnet if needed.
    async fn attach_or_add(&self, identifier: &str) -> Result<JobHandle, EngineError> {
        if let Some(hash) = info_hash_from_magnet(identifier) {
            if let Some(job) = self.engine.find(&hash).await {
                debug!(hash = %job.info_hash, "Attaching to existing engine job");
                return Ok(job);
            }
        }

        match self.engine.add(identifier).await {
            Ok(job) => Ok(job),
            Err(EngineError::AlreadyExists(job)) => {
                debug!(hash = %job.info_hash, "Engine already holds job, attaching");
                Ok(job)
            }
            Err(e) => Err(e),
        }
    }

    async fn record_endpoint(
        &self,
        identifier: &str,
        job: JobHandle,
        file: FileChoice,
        endpoint: StreamEndpoint,
    ) -> Result<StartOutcome, StreamError> {
        let mut table = self.table.lock().await;

        if !table.is_active(identifier) {
            drop(table);
            return Err(self.abandon(identifier, Some(endpoint)).await);
        }

        let entry = table
            .sessions
            .entry(identifier.to_string())
            .or_insert_with(SessionEntry::pending);

        // A concurrent start for the same identifier won the race.
        if let Some(outcome) = entry.ready_outcome(Some(file.index)) {
            drop(table);
            endpoint.shutdown().await;
            STREAM_STARTS.with_label_values(&["resumed"]).inc();
            return Ok(outcome);
        }

        let url = endpoint.url().to_string();
        let replaced = entry.endpoint.replace(endpoint);
        entry.status = SessionStatus::Ready;
        entry.job = Some(job.clone());

        if entry.reporter.is_none() {
            let cancel = CancellationToken::new();
            let task = spawn_reporter(
                self.engine.clone(),
                self.hub.clone(),
                identifier.to_string(),
                job,
                self.progress_interval,
                cancel.clone(),
            );
            entry.reporter = Some(Reporter { cancel, task });
        }
        drop(table);

        if let Some(old) = replaced {
            old.shutdown().await;
        }

        STREAM_STARTS.with_label_values(&["ready"]).inc();
        info!(identifier = %identifier, url = %url, file = %file.name, "Stream ready");
        Ok(StartOutcome::Ready { url, file })
    }

    fn superseded(&self, identifier: &str) -> StreamError {
        STREAM_STARTS.with_label_values(&["superseded"]).inc();
        debug!(identifier = %identifier, "Stream start superseded");
        StreamError::Superseded(identifier.to_string())
    }

    /// Clean up after a start that lost the active slot mid-flight.
    async fn abandon(&self, identifier: &str, endpoint: Option<StreamEndpoint>) -> StreamError {
        if let Some(endpoint) = endpoint {
            endpoint.shutdown().await;
        }
        // only if nobody re-activated it meanwhile
        let still_inactive = !self.table.lock().await.is_active(identifier);
        if still_inactive {
            self.stop(identifier).await;
        }
        self.superseded(identifier)
    }

    /// Map a start failure. A start that was superseded reports that instead
    /// of the engine error the teardown caused.
    async fn fail(&self, identifier: &str, error: StreamError) -> StreamError {
        let mut table = self.table.lock().await;
        if !table.is_active(identifier) {
            drop(table);
            return self.abandon(identifier, None).await;
        }
        if let Some(entry) = table.sessions.get_mut(identifier) {
            if entry.endpoint.is_none() {
                entry.status = SessionStatus::Error;
            }
        }
        drop(table);

        STREAM_STARTS.with_label_values(&["error"]).inc();
        warn!(identifier = %identifier, error = %error, "Stream start failed");
        error
    }

    /// Stop `identifier`: endpoint, reporter and engine job. Files stay on disk.
    ///
    /// Returns whether anything was running.
    pub async fn stop(&self, identifier: &str) -> bool {
        let entry = {
            let mut table = self.table.lock().await;
            if table.is_active(identifier) {
                table.active = None;
            }
            table.sessions.remove(identifier)
        };

        let mut stopped = false;
        let mut job = None;
        if let Some(entry) = entry {
            stopped = true;
            if let Some(reporter) = entry.reporter {
                reporter.stop();
            }
            if let Some(endpoint) = entry.endpoint {
                endpoint.shutdown().await;
            }
            job = entry.job;
        }

        // also catches jobs whose start never got to record them
        if job.is_none() {
            if let Some(hash) = info_hash_from_magnet(identifier) {
                job = self.engine.find(&hash).await;
            }
        }

        if let Some(job) = job {
            if self.job_in_use(&job.info_hash).await {
                // another magnet for the same torrent owns it now
                debug!(
                    identifier = %identifier,
                    hash = %job.info_hash,
                    "Engine job shared, keeping it"
                );
            } else {
                match self.engine.remove(&job, false).await {
                    Ok(()) => stopped = true,
                    Err(EngineError::NotFound(_)) => {}
                    Err(e) => {
                        warn!(hash = %job.info_hash, error = %e, "Failed to remove engine job")
                    }
                }
            }
        }

        if stopped {
            info!(identifier = %identifier, "Stream stopped");
        }
        stopped
    }

    /// Whether the active identifier or a session still in the table
    /// resolves to `info_hash`.
    async fn job_in_use(&self, info_hash: &str) -> bool {
        let table = self.table.lock().await;
        let matches = |hash: Option<String>| hash.is_some_and(|h| h.eq_ignore_ascii_case(info_hash));

        matches(table.active.as_deref().and_then(info_hash_from_magnet))
            || table.sessions.iter().any(|(identifier, entry)| {
                matches(
                    entry
                        .job
                        .as_ref()
                        .map(|job| job.info_hash.clone())
                        .or_else(|| info_hash_from_magnet(identifier)),
                )
            })
    }

    /// Stop whichever session is active.
    pub async fn stop_active(&self) -> bool {
        let active = self.table.lock().await.active.clone();
        match active {
            Some(identifier) => self.stop(&identifier).await,
            None => false,
        }
    }

    /// Stop every session and remove every remaining engine job.
    pub async fn stop_all(&self) {
        let identifiers: Vec<String> = {
            let table = self.table.lock().await;
            table.sessions.keys().cloned().collect()
        };
        for identifier in identifiers {
            self.stop(&identifier).await;
        }

        for job in self.engine.jobs().await {
            if let Err(e) = self.engine.remove(&job, false).await {
                warn!(hash = %job.info_hash, error = %e, "Failed to remove engine job");
            }
        }
    }

    /// Forward a session-wide upload limit to the engine. 0 means unlimited.
    pub async fn update_bandwidth_limit(&self, bytes_per_sec: u64) {
        self.engine.set_upload_limit(bytes_per_sec).await;
    }

    /// Stop every endpoint and reporter, then destroy the engine.
    pub async fn shutdown(&self) {
        let entries: Vec<SessionEntry> = {
            let mut table = self.table.lock().await;
            table.active = None;
            table.sessions.drain().map(|(_, entry)| entry).collect()
        };

        for entry in entries {
            if let Some(reporter) = entry.reporter {
                reporter.stop();
            }
            if let Some(endpoint) = entry.endpoint {
                endpoint.shutdown().await;
            }
        }

        self.engine.shutdown().await;
        info!("Session manager shut down");
    }
}
