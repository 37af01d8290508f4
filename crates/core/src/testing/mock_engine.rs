//! Mock torrent engine for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::{
    EngineError, FileReader, JobFile, JobHandle, JobStats, TorrentEngine,
};
use crate::searcher::magnet::info_hash_from_magnet;

/// File list a job gets when nothing was registered for its magnet.
const DEFAULT_FILE: (&str, u64) = ("movie.mkv", 1_000_000);

#[derive(Debug, Clone)]
struct MockJob {
    handle: JobHandle,
    files: Vec<JobFile>,
    /// Bytes served for file 0. Other files read as zeros.
    content: Option<Vec<u8>>,
    stats: JobStats,
}

/// Mock implementation of the TorrentEngine trait.
///
/// Provides controllable behavior for testing:
/// - Register file lists per magnet before a session adds it
/// - Serve in-memory file content
/// - Delay metadata resolution to widen race windows
/// - Record removals and the upload limit for assertions
///
/// # Example
///
/// ```rust,ignore
/// let engine = MockEngine::new();
/// engine.register_files(MAGNET, vec![("S01E01.mkv", 1000), ("S01E02.mkv", 1000)]).await;
///
/// let job = engine.add(MAGNET).await?;
/// assert_eq!(engine.files(&job).await?.len(), 2);
///
/// engine.remove(&job, false).await?;
/// assert_eq!(engine.removed().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockEngine {
    jobs: Arc<RwLock<HashMap<String, MockJob>>>,
    /// File lists keyed by info hash, used by `add`.
    registered: Arc<RwLock<HashMap<String, Vec<(String, u64)>>>>,
    /// Delays applied to `files` keyed by info hash.
    files_delay: Arc<RwLock<HashMap<String, Duration>>>,
    /// If set, the next fallible operation fails with this error.
    next_error: Arc<RwLock<Option<EngineError>>>,
    add_calls: Arc<RwLock<Vec<String>>>,
    removed: Arc<RwLock<Vec<(String, bool)>>>,
    upload_limit: Arc<RwLock<u64>>,
    shut_down: Arc<RwLock<bool>>,
    /// When set, `find` reports nothing so callers must go through `add`.
    find_disabled: Arc<RwLock<bool>>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            registered: Arc::new(RwLock::new(HashMap::new())),
            files_delay: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            add_calls: Arc::new(RwLock::new(Vec::new())),
            removed: Arc::new(RwLock::new(Vec::new())),
            upload_limit: Arc::new(RwLock::new(0)),
            shut_down: Arc::new(RwLock::new(false)),
            find_disabled: Arc::new(RwLock::new(false)),
        }
    }

    /// Info hash the mock uses for `magnet`. Short test hashes are padded
    /// with zeros to 40 characters.
    pub fn hash_for(magnet: &str) -> String {
        if let Some(hash) = info_hash_from_magnet(magnet) {
            return hash;
        }
        let lower = magnet.to_ascii_lowercase();
        let raw = lower
            .split_once("xt=urn:btih:")
            .map(|(_, rest)| rest.split('&').next().unwrap_or_default())
            .unwrap_or(lower.as_str());
        let mut hash: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).take(40).collect();
        while hash.len() < 40 {
            hash.push('0');
        }
        hash
    }

    fn display_name(magnet: &str) -> Option<String> {
        magnet
            .split('&')
            .find_map(|part| part.strip_prefix("dn="))
            .map(|name| urlencoding::decode(name).map(|n| n.into_owned()).unwrap_or_else(|_| name.to_string()))
    }

    fn build_job(magnet: &str, files: Vec<(String, u64)>, content: Option<Vec<u8>>) -> MockJob {
        let files: Vec<JobFile> = files
            .into_iter()
            .enumerate()
            .map(|(index, (name, size))| JobFile { index, name, size })
            .collect();
        let length = files.iter().map(|f| f.size).sum();

        MockJob {
            handle: JobHandle {
                info_hash: Self::hash_for(magnet),
                name: Self::display_name(magnet),
            },
            files,
            content,
            stats: JobStats {
                length,
                ..Default::default()
            },
        }
    }

    /// Set the file list a later `add` of `magnet` will produce.
    pub async fn register_files(&self, magnet: &str, files: Vec<(&str, u64)>) {
        self.registered.write().await.insert(
            Self::hash_for(magnet),
            files.into_iter().map(|(n, s)| (n.to_string(), s)).collect(),
        );
    }

    /// Delay metadata resolution for `magnet` by `delay`.
    pub async fn set_files_delay(&self, magnet: &str, delay: Duration) {
        self.files_delay
            .write()
            .await
            .insert(Self::hash_for(magnet), delay);
    }

    /// Pre-populate a job without going through `add`.
    pub async fn insert_job(&self, magnet: &str, files: Vec<(&str, u64)>) -> JobHandle {
        let files = files.into_iter().map(|(n, s)| (n.to_string(), s)).collect();
        let job = Self::build_job(magnet, files, None);
        let handle = job.handle.clone();
        self.jobs.write().await.insert(handle.info_hash.clone(), job);
        handle
    }

    /// Pre-populate a single-file job whose file reads as `content`.
    pub async fn insert_job_with_content(
        &self,
        magnet: &str,
        name: &str,
        content: Vec<u8>,
    ) -> JobHandle {
        let files = vec![(name.to_string(), content.len() as u64)];
        let job = Self::build_job(magnet, files, Some(content));
        let handle = job.handle.clone();
        self.jobs.write().await.insert(handle.info_hash.clone(), job);
        handle
    }

    pub async fn set_stats(&self, info_hash: &str, stats: JobStats) {
        if let Some(job) = self.jobs.write().await.get_mut(info_hash) {
            job.stats = stats;
        }
    }

    /// Make `find` miss every job, as an engine that has not indexed a
    /// concurrent add yet would.
    pub async fn set_find_disabled(&self, disabled: bool) {
        *self.find_disabled.write().await = disabled;
    }

    /// Configure the next fallible operation to fail with the given error.
    pub async fn set_next_error(&self, error: EngineError) {
        *self.next_error.write().await = Some(error);
    }

    /// Magnets passed to `add`, in call order.
    pub async fn add_calls(&self) -> Vec<String> {
        self.add_calls.read().await.clone()
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn has_job(&self, info_hash: &str) -> bool {
        self.jobs.read().await.contains_key(info_hash)
    }

    /// Recorded removals as `(info_hash, delete_files)`.
    pub async fn removed(&self) -> Vec<(String, bool)> {
        self.removed.read().await.clone()
    }

    pub async fn upload_limit(&self) -> u64 {
        *self.upload_limit.read().await
    }

    pub async fn is_shut_down(&self) -> bool {
        *self.shut_down.read().await
    }

    async fn take_error(&self) -> Option<EngineError> {
        self.next_error.write().await.take()
    }

    async fn job(&self, handle: &JobHandle) -> Result<MockJob, EngineError> {
        self.jobs
            .read()
            .await
            .get(&handle.info_hash)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(handle.info_hash.clone()))
    }
}

#[async_trait]
impl TorrentEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn add(&self, magnet: &str) -> Result<JobHandle, EngineError> {
        self.add_calls.write().await.push(magnet.to_string());
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        if !magnet.starts_with("magnet:?") {
            return Err(EngineError::InvalidMagnet(magnet.to_string()));
        }

        let hash = Self::hash_for(magnet);
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(&hash) {
            return Err(EngineError::AlreadyExists(existing.handle.clone()));
        }

        let files = self
            .registered
            .read()
            .await
            .get(&hash)
            .cloned()
            .unwrap_or_else(|| vec![(DEFAULT_FILE.0.to_string(), DEFAULT_FILE.1)]);
        let job = Self::build_job(magnet, files, None);
        let handle = job.handle.clone();
        jobs.insert(hash, job);
        Ok(handle)
    }

    async fn find(&self, info_hash: &str) -> Option<JobHandle> {
        if *self.find_disabled.read().await {
            return None;
        }
        self.jobs
            .read()
            .await
            .get(&info_hash.to_ascii_lowercase())
            .map(|job| job.handle.clone())
    }

    async fn jobs(&self) -> Vec<JobHandle> {
        self.jobs
            .read()
            .await
            .values()
            .map(|job| job.handle.clone())
            .collect()
    }

    async fn files(&self, job: &JobHandle) -> Result<Vec<JobFile>, EngineError> {
        let delay = self.files_delay.read().await.get(&job.info_hash).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        Ok(self.job(job).await?.files)
    }

    async fn open_file(
        &self,
        job: &JobHandle,
        index: usize,
    ) -> Result<Box<dyn FileReader>, EngineError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        let job = self.job(job).await?;
        let file = job
            .files
            .get(index)
            .ok_or(EngineError::FileIndexOutOfRange {
                index,
                count: job.files.len(),
            })?;

        let bytes = match (&job.content, index) {
            (Some(content), 0) => content.clone(),
            _ => vec![0u8; file.size as usize],
        };
        Ok(Box::new(Cursor::new(bytes)))
    }

    async fn stats(&self, job: &JobHandle) -> Result<JobStats, EngineError> {
        Ok(self.job(job).await?.stats)
    }

    async fn remove(&self, job: &JobHandle, delete_files: bool) -> Result<(), EngineError> {
        if let Some(e) = self.take_error().await {
            return Err(e);
        }
        if self.jobs.write().await.remove(&job.info_hash).is_none() {
            return Err(EngineError::NotFound(job.info_hash.clone()));
        }
        self.removed
            .write()
            .await
            .push((job.info_hash.clone(), delete_files));
        Ok(())
    }

    async fn set_upload_limit(&self, bytes_per_sec: u64) {
        *self.upload_limit.write().await = bytes_per_sec;
    }

    async fn shutdown(&self) {
        self.jobs.write().await.clear();
        *self.shut_down.write().await = true;
    }
}
