//! Torrent-to-HTTP streaming sessions.
//!
//! [`SessionManager`] owns the session table and the single active
//! identifier, [`StreamEndpoint`] serves the chosen file over local HTTP, and
//! progress snapshots flow through a [`ProgressHub`].

mod endpoint;
mod manager;
mod progress;
pub mod selection;
mod types;

pub use endpoint::{parse_range, ByteRange, StreamEndpoint};
pub use manager::SessionManager;
pub use progress::{spawn_reporter, ProgressEvent, ProgressHub};
pub use types::*;
