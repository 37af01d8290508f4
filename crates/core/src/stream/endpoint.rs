//! Local HTTP endpoint serving one file of a torrent job.
//!
//! Each ready session gets its own axum server on an ephemeral port. The
//! response body streams from the engine's file reader, so playback can start
//! before the download completes. Cancelling the endpoint ends every body in
//! flight and stops the server.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::StreamExt;
use std::io::SeekFrom;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{FileChoice, StreamError};
use crate::engine::{JobHandle, TorrentEngine};
use crate::metrics::ACTIVE_ENDPOINTS;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A requested byte range after validation against the file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No (usable) Range header: serve everything.
    Full,
    /// Inclusive bounds.
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

/// Interpret a `Range` header for a file of `size` bytes.
///
/// Only single ranges are honoured. Malformed or multi-range headers are
/// ignored, as RFC 9110 allows.
pub fn parse_range(value: Option<&str>, size: u64) -> ByteRange {
    let Some(ranges) = value.and_then(|v| v.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if ranges.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = ranges.trim().split_once('-') else {
        return ByteRange::Full;
    };

    match (first.trim(), last.trim()) {
        ("", "") => ByteRange::Full,
        // suffix: the last n bytes
        ("", n) => match n.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if size == 0 => ByteRange::Unsatisfiable,
            Ok(n) => ByteRange::Partial {
                start: size.saturating_sub(n),
                end: size - 1,
            },
            Err(_) => ByteRange::Full,
        },
        (a, b) => {
            let Ok(start) = a.parse::<u64>() else {
                return ByteRange::Full;
            };
            let end = if b.is_empty() {
                None
            } else {
                match b.parse::<u64>() {
                    Ok(end) => Some(end),
                    Err(_) => return ByteRange::Full,
                }
            };
            if start >= size {
                return ByteRange::Unsatisfiable;
            }
            match end {
                Some(end) if end < start => ByteRange::Full,
                Some(end) => ByteRange::Partial {
                    start,
                    end: end.min(size - 1),
                },
                None => ByteRange::Partial {
                    start,
                    end: size - 1,
                },
            }
        }
    }
}

#[derive(Clone)]
struct EndpointState {
    engine: Arc<dyn TorrentEngine>,
    job: JobHandle,
    file: FileChoice,
    content_type: String,
    cancel: CancellationToken,
}

/// A bound, serving endpoint. Dropping it stops the server.
pub struct StreamEndpoint {
    url: String,
    addr: SocketAddr,
    file: FileChoice,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StreamEndpoint {
    /// Bind an ephemeral port on `host` and start serving `file` of `job`.
    pub async fn bind(
        host: IpAddr,
        engine: Arc<dyn TorrentEngine>,
        job: JobHandle,
        file: FileChoice,
    ) -> Result<Self, StreamError> {
        let listener = TcpListener::bind(SocketAddr::new(host, 0))
            .await
            .map_err(|e| StreamError::Bind(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| StreamError::Bind(e.to_string()))?;

        let cancel = CancellationToken::new();
        let state = EndpointState {
            engine,
            job,
            content_type: mime_guess::from_path(&file.name)
                .first_or_octet_stream()
                .to_string(),
            file: file.clone(),
            cancel: cancel.clone(),
        };

        let router = Router::new()
            .route("/{index}", get(serve_file))
            .with_state(state);

        let shutdown = cancel.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
            {
                warn!(error = %e, "Stream endpoint server error");
            }
        });

        let url = format!("http://{}/{}", SocketAddr::new(url_host(host), addr.port()), file.index);
        ACTIVE_ENDPOINTS.inc();
        info!(url = %url, file = %file.name, "Stream endpoint listening");

        Ok(Self {
            url,
            addr,
            file,
            cancel,
            task: Some(task),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn file(&self) -> &FileChoice {
        &self.file
    }

    /// Stop serving and wait briefly for the server task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut task).await.is_err() {
                warn!(url = %self.url, "Stream endpoint did not stop in time, aborting");
                task.abort();
            }
        }
        debug!(url = %self.url, "Stream endpoint stopped");
    }
}

impl Drop for StreamEndpoint {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        ACTIVE_ENDPOINTS.dec();
    }
}

/// Loopback for wildcard binds so the URL is reachable.
fn url_host(host: IpAddr) -> IpAddr {
    match host {
        IpAddr::V4(v4) if v4.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(v6) if v6.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        other => other,
    }
}

async fn serve_file(
    State(state): State<EndpointState>,
    Path(index): Path<usize>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    if index != state.file.index {
        return StatusCode::NOT_FOUND.into_response();
    }

    let size = state.file.size;
    let range = parse_range(
        headers.get(header::RANGE).and_then(|v| v.to_str().ok()),
        size,
    );

    let (status, start, length) = match range {
        ByteRange::Full => (StatusCode::OK, 0, size),
        ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        ByteRange::Unsatisfiable => {
            return (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(
                    header::CONTENT_RANGE,
                    HeaderValue::from_str(&format!("bytes */{}", size))
                        .unwrap_or_else(|_| HeaderValue::from_static("bytes */0")),
                )],
            )
                .into_response();
        }
    };

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        let mut reader = match state.engine.open_file(&state.job, index).await {
            Ok(reader) => reader,
            Err(e) => {
                warn!(hash = %state.job.info_hash, index = index, error = %e, "Failed to open file");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        };
        if start > 0 {
            if let Err(e) = reader.seek(SeekFrom::Start(start)).await {
                warn!(hash = %state.job.info_hash, error = %e, "Seek failed");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
        let stream = ReaderStream::new(reader.take(length))
            .take_until(state.cancel.clone().cancelled_owned());
        Body::from_stream(stream)
    };

    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, &state.content_type)
        .header(header::CONTENT_LENGTH, length.to_string())
        .header(header::ACCEPT_RANGES, "bytes");
    if status == StatusCode::PARTIAL_CONTENT {
        response = response.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, start + length - 1, size),
        );
    }

    response
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
