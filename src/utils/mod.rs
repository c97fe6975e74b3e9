//! Shared helpers

pub mod logging;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current time in Unix seconds
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
