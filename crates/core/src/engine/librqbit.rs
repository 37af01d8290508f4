//! librqbit embedded engine implementation.

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use librqbit::{
    AddTorrent, AddTorrentOptions, AddTorrentResponse, ManagedTorrent, Session, SessionOptions,
};
use tracing::{debug, info};

use super::{EngineError, FileReader, JobFile, JobHandle, JobStats, TorrentEngine};
use crate::config::EngineConfig;

/// Embedded librqbit session shared by every stream.
pub struct LibrqbitEngine {
    session: Arc<Session>,
    download_path: PathBuf,
}

impl LibrqbitEngine {
    /// Create a new engine from configuration.
    pub async fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let download_path = config.download_path.clone();

        tokio::fs::create_dir_all(&download_path).await.map_err(|e| {
            EngineError::Init(format!(
                "Failed to create download directory {}: {}",
                download_path.display(),
                e
            ))
        })?;

        let mut opts = SessionOptions::default();

        if !config.enable_dht {
            opts.disable_dht = true;
        }

        // Range, not RangeInclusive
        if let Some(port) = config.listen_port {
            opts.listen_port_range = Some(port..(port + 1));
        }

        info!(
            download_path = %download_path.display(),
            dht_enabled = !opts.disable_dht,
            "Initializing librqbit session"
        );

        let session = Session::new_with_opts(download_path.clone(), opts)
            .await
            .map_err(|e| {
                EngineError::Init(format!("Failed to initialize librqbit session: {}", e))
            })?;

        if let Some(port) = session.tcp_listen_port() {
            info!(port = port, "librqbit listening on TCP port");
        }

        let engine = Self {
            session,
            download_path,
        };
        engine
            .set_upload_limit(config.upload_limit_bytes_per_sec)
            .await;
        Ok(engine)
    }

    pub fn download_path(&self) -> &PathBuf {
        &self.download_path
    }

    /// Lowercase hex, the form every other layer keys jobs by.
    fn format_hash(hash: &librqbit_core::Id20) -> String {
        hash.as_string()
    }

    fn handle_of(torrent: &Arc<ManagedTorrent>) -> JobHandle {
        JobHandle {
            info_hash: Self::format_hash(&torrent.info_hash()),
            name: torrent.name().map(|s| s.to_string()),
        }
    }

    fn find_torrent(&self, info_hash: &str) -> Option<Arc<ManagedTorrent>> {
        let wanted = info_hash.to_lowercase();

        self.session.with_torrents(|iter| {
            for (_, torrent) in iter {
                if Self::format_hash(&torrent.info_hash()) == wanted {
                    return Some(torrent.clone());
                }
            }
            None
        })
    }

    fn require(&self, job: &JobHandle) -> Result<Arc<ManagedTorrent>, EngineError> {
        self.find_torrent(&job.info_hash)
            .ok_or_else(|| EngineError::NotFound(job.info_hash.clone()))
    }
}

/// Clamp a byte rate into the range librqbit's limiter accepts. 0 disables the limit.
fn upload_limit_bps(bytes_per_sec: u64) -> Option<NonZeroU32> {
    NonZeroU32::new(bytes_per_sec.min(u32::MAX as u64) as u32)
}

#[async_trait]
impl TorrentEngine for LibrqbitEngine {
    fn name(&self) -> &str {
        "librqbit"
    }

    async fn add(&self, magnet: &str) -> Result<JobHandle, EngineError> {
        if !magnet.starts_with("magnet:") {
            return Err(EngineError::InvalidMagnet(magnet.to_string()));
        }

        let opts = AddTorrentOptions {
            overwrite: true,
            ..Default::default()
        };

        let response = self
            .session
            .add_torrent(AddTorrent::from_url(magnet), Some(opts))
            .await
            .map_err(|e| EngineError::Engine(format!("Failed to add torrent: {}", e)))?;

        match response {
            AddTorrentResponse::Added(_, handle) => {
                let job = Self::handle_of(&handle);
                debug!(hash = %job.info_hash, name = ?job.name, "Torrent added");
                Ok(job)
            }
            AddTorrentResponse::AlreadyManaged(_, handle) => {
                Err(EngineError::AlreadyExists(Self::handle_of(&handle)))
            }
            AddTorrentResponse::ListOnly(_) => Err(EngineError::Engine(
                "Torrent was added in list-only mode".to_string(),
            )),
        }
    }

    async fn find(&self, info_hash: &str) -> Option<JobHandle> {
        self.find_torrent(info_hash).map(|t| Self::handle_of(&t))
    }

    async fn jobs(&self) -> Vec<JobHandle> {
        self.session
            .with_torrents(|iter| iter.map(|(_, t)| Self::handle_of(t)).collect())
    }

    async fn files(&self, job: &JobHandle) -> Result<Vec<JobFile>, EngineError> {
        let torrent = self.require(job)?;

        torrent
            .wait_until_initialized()
            .await
            .map_err(|e| EngineError::Engine(format!("Torrent initialization failed: {}", e)))?;

        torrent
            .with_metadata(|metadata| {
                metadata
                    .file_infos
                    .iter()
                    .enumerate()
                    .map(|(index, fi)| JobFile {
                        index,
                        name: fi.relative_filename.to_string_lossy().into_owned(),
                        size: fi.len,
                    })
                    .collect::<Vec<_>>()
            })
            .map_err(|e| EngineError::Engine(format!("Torrent metadata unavailable: {}", e)))
    }

    async fn open_file(
        &self,
        job: &JobHandle,
        index: usize,
    ) -> Result<Box<dyn FileReader>, EngineError> {
        let torrent = self.require(job)?;
        let stream = torrent
            .stream(index)
            .map_err(|e| EngineError::Engine(format!("Failed to open file {}: {}", index, e)))?;
        Ok(Box::new(stream))
    }

    async fn stats(&self, job: &JobHandle) -> Result<JobStats, EngineError> {
        let torrent = self.require(job)?;
        let stats = torrent.stats();

        let (download_speed, num_peers) = stats
            .live
            .as_ref()
            .map(|live| {
                // librqbit's "mbps" is MiB/s
                let speed = (live.download_speed.mbps * 1024.0 * 1024.0) as u64;
                (speed, live.snapshot.peer_stats.live as u32)
            })
            .unwrap_or((0, 0));

        Ok(JobStats {
            downloaded: stats.progress_bytes,
            length: stats.total_bytes,
            download_speed,
            num_peers,
        })
    }

    async fn remove(&self, job: &JobHandle, delete_files: bool) -> Result<(), EngineError> {
        let torrent = self.require(job)?;

        self.session
            .delete(torrent.id().into(), delete_files)
            .await
            .map_err(|e| EngineError::Engine(format!("Failed to remove torrent: {}", e)))?;

        debug!(hash = %job.info_hash, delete_files = delete_files, "Torrent removed");
        Ok(())
    }

    async fn set_upload_limit(&self, bytes_per_sec: u64) {
        self.session
            .ratelimits
            .set_upload_bps(upload_limit_bps(bytes_per_sec));
        info!(bytes_per_sec = bytes_per_sec, "Upload limit updated");
    }

    async fn shutdown(&self) {
        info!("Stopping librqbit session");
        self.session.stop().await;
    }
}
