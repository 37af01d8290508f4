//! Types for the torrent engine boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncSeek};

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Torrent job not found: {0}")]
    NotFound(String),

    /// The engine already manages this torrent. Carries the existing job so
    /// that callers can attach to it.
    #[error("Torrent job already exists: {}", .0.info_hash)]
    AlreadyExists(JobHandle),

    #[error("Invalid magnet: {0}")]
    InvalidMagnet(String),

    #[error("File index {index} out of range ({count} files)")]
    FileIndexOutOfRange { index: usize, count: usize },

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Engine initialization failed: {0}")]
    Init(String),
}

/// Reference to a job held by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    /// Lowercase hex info hash.
    pub info_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl JobHandle {
    pub fn new(info_hash: impl Into<String>) -> Self {
        Self {
            info_hash: info_hash.into(),
            name: None,
        }
    }
}

/// A file inside a torrent, in torrent order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFile {
    pub index: usize,
    /// Path relative to the torrent root.
    pub name: String,
    pub size: u64,
}

/// Point-in-time transfer statistics of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    pub downloaded: u64,
    pub length: u64,
    /// Bytes per second.
    pub download_speed: u64,
    pub num_peers: u32,
}

impl JobStats {
    /// Fraction downloaded in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.length == 0 {
            0.0
        } else {
            (self.downloaded as f64 / self.length as f64).clamp(0.0, 1.0)
        }
    }
}

/// Seekable byte stream over one file of a job. Reads block until the
/// requested pieces are downloaded.
pub trait FileReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> FileReader for T {}

/// The external BitTorrent engine. Only orchestrated, never reimplemented.
#[async_trait]
pub trait TorrentEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Add a magnet. Fails with [`EngineError::AlreadyExists`] when the
    /// torrent is already managed.
    async fn add(&self, magnet: &str) -> Result<JobHandle, EngineError>;

    /// Look up a managed job by info hash.
    async fn find(&self, info_hash: &str) -> Option<JobHandle>;

    /// Every job currently managed.
    async fn jobs(&self) -> Vec<JobHandle>;

    /// Wait for metadata and return the file list.
    async fn files(&self, job: &JobHandle) -> Result<Vec<JobFile>, EngineError>;

    /// Open a seekable reader over file `index`.
    async fn open_file(
        &self,
        job: &JobHandle,
        index: usize,
    ) -> Result<Box<dyn FileReader>, EngineError>;

    async fn stats(&self, job: &JobHandle) -> Result<JobStats, EngineError>;

    /// Remove a job. Downloaded data stays on disk unless `delete_files` is set.
    async fn remove(&self, job: &JobHandle, delete_files: bool) -> Result<(), EngineError>;

    /// Session-wide upload limit in bytes per second; 0 means unlimited.
    async fn set_upload_limit(&self, bytes_per_sec: u64);

    /// Stop the engine and release its listeners.
    async fn shutdown(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_fraction() {
        let stats = JobStats {
            downloaded: 25,
            length: 100,
            ..Default::default()
        };
        assert_eq!(stats.progress(), 0.25);
    }

    #[test]
    fn test_progress_zero_length() {
        assert_eq!(JobStats::default().progress(), 0.0);
    }

    #[test]
    fn test_already_exists_message() {
        let err = EngineError::AlreadyExists(JobHandle::new("abc"));
        assert_eq!(err.to_string(), "Torrent job already exists: abc");
    }

    #[test]
    fn test_job_file_serialization() {
        let file = JobFile {
            index: 2,
            name: "Show/S01E01.mkv".to_string(),
            size: 1024,
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains(r#""index":2"#));
    }
}
