//! Torrent engine abstraction.
//!
//! This module provides a `TorrentEngine` trait over the embedded BitTorrent
//! session. The stream manager only talks to this trait.

mod librqbit;
mod types;

pub use self::librqbit::LibrqbitEngine;
pub use types::*;
