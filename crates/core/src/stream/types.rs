//! Types for streaming sessions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{EngineError, JobFile};

/// A file offered to (or chosen for) the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChoice {
    pub name: String,
    pub index: usize,
    pub size: u64,
}

impl From<&JobFile> for FileChoice {
    fn from(file: &JobFile) -> Self {
        Self {
            name: file.name.clone(),
            index: file.index,
            size: file.size,
        }
    }
}

/// Result of starting a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartOutcome {
    /// The file is being served at `url`.
    Ready { url: String, file: FileChoice },
    /// Several files are plausible; call again with a file index.
    SelectFile { files: Vec<FileChoice> },
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Ready,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Ready => "ready",
            SessionStatus::Error => "error",
        }
    }
}

/// Public view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub identifier: String,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileChoice>,
}

/// Errors that can occur while starting or stopping a stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid file index: {0}")]
    InvalidFileIndex(usize),

    #[error("Torrent has no files")]
    NoFiles,

    #[error("Failed to bind stream endpoint: {0}")]
    Bind(String),

    /// Another identifier became active while this one was starting.
    #[error("Stream start superseded: {0}")]
    Superseded(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_outcome_ready_serialization() {
        let outcome = StartOutcome::Ready {
            url: "http://127.0.0.1:4000/0".to_string(),
            file: FileChoice {
                name: "movie.mkv".to_string(),
                index: 0,
                size: 10,
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["url"], "http://127.0.0.1:4000/0");
        assert_eq!(json["file"]["name"], "movie.mkv");
    }

    #[test]
    fn test_start_outcome_select_file_serialization() {
        let outcome = StartOutcome::SelectFile { files: vec![] };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "select_file");
        assert!(json["files"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_engine_error_is_transparent() {
        let err: StreamError = EngineError::NotFound("abc".to_string()).into();
        assert_eq!(err.to_string(), "Torrent job not found: abc");
    }
}
