//! Disk quota over the shared download directory.
//!
//! Each top-level entry of the directory is one torrent job's data and is
//! deleted as a unit, least recently modified first.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::metrics::CACHE_BYTES_RECLAIMED;

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Quota task failed: {0}")]
    Task(String),
}

/// What an enforcement pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuotaReport {
    pub total_before: u64,
    pub total_after: u64,
    pub removed: Vec<PathBuf>,
    /// Entries that could not be sized or deleted.
    pub errors: Vec<String>,
}

impl QuotaReport {
    pub fn reclaimed(&self) -> u64 {
        self.total_before.saturating_sub(self.total_after)
    }
}

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Keeps the download directory under a byte limit.
#[derive(Debug)]
pub struct QuotaEnforcer {
    root: PathBuf,
    limit: AtomicU64,
}

impl QuotaEnforcer {
    pub fn new(root: impl Into<PathBuf>, limit_bytes: u64) -> Self {
        Self {
            root: root.into(),
            limit: AtomicU64::new(limit_bytes),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limit(&self) -> u64 {
        self.limit.load(Ordering::Relaxed)
    }

    pub fn set_limit(&self, limit_bytes: u64) {
        self.limit.store(limit_bytes, Ordering::Relaxed);
        debug!(limit_bytes = limit_bytes, "Cache limit updated");
    }

    /// Delete oldest entries until the directory fits the limit.
    pub async fn enforce_quota(&self) -> Result<QuotaReport, QuotaError> {
        let root = self.root.clone();
        let limit = self.limit();
        let report = tokio::task::spawn_blocking(move || enforce_blocking(&root, Some(limit)))
            .await
            .map_err(|e| QuotaError::Task(e.to_string()))??;

        if report.removed.is_empty() {
            debug!(total = report.total_before, limit = limit, "Cache within limit");
        } else {
            info!(
                removed = report.removed.len(),
                reclaimed = report.reclaimed(),
                total_after = report.total_after,
                limit = limit,
                "Cache quota enforced"
            );
        }
        Ok(report)
    }

    /// Delete every entry regardless of the limit.
    pub async fn wipe(&self) -> Result<QuotaReport, QuotaError> {
        let root = self.root.clone();
        let report = tokio::task::spawn_blocking(move || enforce_blocking(&root, None))
            .await
            .map_err(|e| QuotaError::Task(e.to_string()))??;

        info!(
            removed = report.removed.len(),
            reclaimed = report.reclaimed(),
            "Cache wiped"
        );
        Ok(report)
    }
}

/// `limit == None` deletes everything.
fn enforce_blocking(root: &Path, limit: Option<u64>) -> Result<QuotaReport, QuotaError> {
    let mut report = QuotaReport::default();

    let mut entries = match list_entries(root, &mut report.errors) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
        Err(source) => {
            return Err(QuotaError::Scan {
                path: root.to_path_buf(),
                source,
            })
        }
    };

    let mut total: u64 = entries.iter().map(|e| e.size).sum();
    report.total_before = total;

    if limit.is_some_and(|limit| total <= limit) {
        report.total_after = total;
        return Ok(report);
    }

    entries.sort_by_key(|e| e.modified);

    for entry in entries {
        if limit.is_some_and(|limit| total <= limit) {
            break;
        }
        match remove_entry(&entry.path) {
            Ok(()) => {
                total = total.saturating_sub(entry.size);
                CACHE_BYTES_RECLAIMED.inc_by(entry.size);
                debug!(path = %entry.path.display(), size = entry.size, "Removed cache entry");
                report.removed.push(entry.path);
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "Failed to remove cache entry");
                report
                    .errors
                    .push(format!("{}: {}", entry.path.display(), e));
            }
        }
    }

    report.total_after = total;
    Ok(report)
}

fn list_entries(root: &Path, errors: &mut Vec<String>) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(root)? {
        let path = match dir_entry {
            Ok(e) => e.path(),
            Err(e) => {
                errors.push(format!("{}: {}", root.display(), e));
                continue;
            }
        };

        let modified = match fs::symlink_metadata(&path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat cache entry");
                errors.push(format!("{}: {}", path.display(), e));
                continue;
            }
        };

        let size = tree_size(&path, errors);
        entries.push(Entry {
            path,
            size,
            modified,
        });
    }

    Ok(entries)
}

/// Recursive size in bytes. Symlinks count as themselves, never their targets.
///
/// Children that cannot be read are logged and left out; the rest still counts.
fn tree_size(path: &Path, errors: &mut Vec<String>) -> u64 {
    let mut total = 0;
    for item in WalkDir::new(path).follow_links(false) {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                let failed = e.path().unwrap_or(path).display().to_string();
                warn!(path = %failed, error = %e, "Failed to size cache entry");
                errors.push(format!("{}: {}", failed, e));
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        match entry.metadata() {
            Ok(meta) => total += meta.len(),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to size cache entry");
                errors.push(format!("{}: {}", entry.path().display(), e));
            }
        }
    }
    total
}

fn remove_entry(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
