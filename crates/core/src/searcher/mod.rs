//! Torrent source aggregation.
//!
//! This module fans a [`SourceQuery`] out to every [`TorrentProvider`] that
//! accepts it, then filters adult content, scores, de-duplicates by info hash
//! and ranks the merged candidates.

mod aggregator;
mod dedup;
pub mod filter;
mod lenient;
pub mod magnet;
pub mod providers;
mod types;

pub use aggregator::SourceAggregator;
pub use dedup::dedup_and_rank;
pub use providers::SourceRecord;
pub use types::*;
