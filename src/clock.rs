//! Wall-clock helper.
//!
//! The gate and token authority take `now` as an explicit parameter so
//! tests can pin time; callers on the request path get it from here.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix time in whole seconds.
///
/// Saturates to zero if the system clock is before the epoch rather than
/// panicking on the request path.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_now_is_recent() {
        // 2024-01-01T00:00:00Z
        assert!(unix_now() > 1_704_067_200);
    }
}
