//! Download cache housekeeping.

mod quota;

pub use quota::{QuotaEnforcer, QuotaError, QuotaReport};
