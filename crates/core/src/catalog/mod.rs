//! Movie and series metadata lookup.
//!
//! Backed by the public Cinemeta addon, which needs no API key.

mod cinemeta;
mod types;

pub use cinemeta::CinemetaClient;
pub use types::*;
