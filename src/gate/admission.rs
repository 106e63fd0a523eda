//! Per-client sliding window admission.
//!
//! Provides a sliding window rate limiter that tracks admitted requests
//! per client address and denies once a client exceeds the configured
//! capacity within the window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::AllowList;
use crate::clock::unix_now;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Allow-listing is enabled and the client is not a member.
    NotWhitelisted,
    /// The client exhausted its window capacity.
    TooManyRequests,
}

/// Outcome of evaluating a request against the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    Denied(DenyReason),
}

impl Decision {
    /// Whether the request may proceed.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admitted)
    }
}

/// A sliding window admission gate that tracks requests per client address.
///
/// Each client can be admitted at most `capacity` times within any window
/// of `window` seconds, measured at evaluation time. One instance owns the
/// whole process's activity log; it must be constructed once at startup and
/// shared, never rebuilt per request.
pub struct AdmissionGate {
    /// Admission timestamps (Unix seconds) per client address
    activity: Mutex<HashMap<String, Vec<u64>>>,
    /// Maximum admissions allowed per window
    capacity: usize,
    /// Length of the sliding window in seconds
    window: u64,
    /// Optional allow-list, checked before any window accounting
    allowlist: Option<AllowList>,
}

impl AdmissionGate {
    /// Create a new admission gate.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum admissions allowed per window
    /// * `window_seconds` - Duration of the sliding window in seconds
    /// * `allowlist` - Allow-list to enforce, or `None` to admit any source
    pub fn new(capacity: usize, window_seconds: u64, allowlist: Option<AllowList>) -> Self {
        Self {
            activity: Mutex::new(HashMap::new()),
            capacity,
            window: window_seconds,
            allowlist,
        }
    }

    /// Evaluate a request from the given client at the given instant.
    ///
    /// The allow-list check runs first: a non-member is denied without
    /// touching the activity log, so it never consumes window capacity.
    /// Otherwise the client's log is pruned to timestamps newer than
    /// `now - window`, and the request is admitted iff the pruned count is
    /// below capacity. A denied request is not recorded, so retrying after
    /// the window drains always succeeds eventually.
    ///
    /// Prune, count, and append happen under one lock acquisition; two
    /// concurrent evaluations for the same client cannot both slip past a
    /// full window.
    pub fn evaluate(&self, client_id: &str, now: u64) -> Decision {
        if let Some(list) = &self.allowlist {
            if !list.contains(client_id) {
                return Decision::Denied(DenyReason::NotWhitelisted);
            }
        }

        let mut activity = self.activity.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = now.saturating_sub(self.window);

        let entry = activity.entry(client_id.to_string()).or_default();

        // Drop timestamps at or before the window start (boundary exclusive)
        entry.retain(|&t| t > cutoff);

        if entry.len() >= self.capacity {
            return Decision::Denied(DenyReason::TooManyRequests);
        }

        entry.push(now);
        Decision::Admitted
    }

    /// Evict clients whose pruned log is empty.
    ///
    /// Correctness never depends on this; it only bounds memory growth in
    /// long-running processes that see many distinct clients.
    pub fn cleanup(&self, now: u64) {
        let mut activity = self.activity.lock().unwrap_or_else(|e| e.into_inner());
        let cutoff = now.saturating_sub(self.window);

        activity.retain(|_, timestamps| {
            timestamps.retain(|&t| t > cutoff);
            !timestamps.is_empty()
        });
    }

    /// Get the number of clients being tracked.
    pub fn tracked_clients(&self) -> usize {
        self.activity
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Start a background cleanup task.
    ///
    /// This spawns a tokio task that periodically evicts stale client
    /// entries to prevent unbounded memory growth.
    pub fn start_cleanup_task(self: &std::sync::Arc<Self>, interval: Duration) {
        let gate = std::sync::Arc::clone(self);
        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            loop {
                interval_timer.tick().await;
                gate.cleanup(unix_now());
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_gate(capacity: usize, window: u64) -> AdmissionGate {
        AdmissionGate::new(capacity, window, None)
    }

    #[test]
    fn test_admits_under_capacity() {
        let gate = open_gate(5, 60);

        for _ in 0..5 {
            assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        }
    }

    #[test]
    fn test_denies_over_capacity() {
        let gate = open_gate(3, 60);

        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());

        assert_eq!(
            gate.evaluate("1.2.3.4", 1000),
            Decision::Denied(DenyReason::TooManyRequests)
        );
    }

    #[test]
    fn test_denied_request_not_recorded() {
        let gate = open_gate(2, 60);

        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());

        // Hammering a full window must not extend the lockout: once the
        // two admissions age out, the client is admitted again even though
        // it kept retrying the whole time.
        for t in 1001..=1060 {
            let _ = gate.evaluate("1.2.3.4", t);
        }
        assert!(gate.evaluate("1.2.3.4", 1061).is_admitted());
    }

    #[test]
    fn test_separate_clients() {
        let gate = open_gate(2, 60);

        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        assert!(!gate.evaluate("1.2.3.4", 1000).is_admitted());

        assert!(gate.evaluate("5.6.7.8", 1000).is_admitted());
        assert!(gate.evaluate("5.6.7.8", 1000).is_admitted());
        assert!(!gate.evaluate("5.6.7.8", 1000).is_admitted());
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let gate = open_gate(1, 10);

        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());

        // Exactly `window` seconds later the old admission falls outside
        assert!(gate.evaluate("1.2.3.4", 1010).is_admitted());
    }

    #[test]
    fn test_window_expiry_readmits() {
        let gate = open_gate(2, 10);

        assert!(gate.evaluate("1.2.3.4", 1000).is_admitted());
        assert!(gate.evaluate("1.2.3.4", 1001).is_admitted());
        assert!(!gate.evaluate("1.2.3.4", 1002).is_admitted());

        assert!(gate.evaluate("1.2.3.4", 1012).is_admitted());
    }

    #[test]
    fn test_burst_within_one_second() {
        let gate = open_gate(20, 10);

        for _ in 0..20 {
            assert!(gate.evaluate("1.2.3.4", 500).is_admitted());
        }
        assert_eq!(
            gate.evaluate("1.2.3.4", 500),
            Decision::Denied(DenyReason::TooManyRequests)
        );

        // Past the window the client is welcome again
        assert!(gate.evaluate("1.2.3.4", 511).is_admitted());
    }

    #[test]
    fn test_whitelist_denial_before_accounting() {
        let gate = AdmissionGate::new(1, 10, Some(AllowList::new(["9.9.9.9"])));

        assert_eq!(
            gate.evaluate("1.1.1.1", 1000),
            Decision::Denied(DenyReason::NotWhitelisted)
        );
        // A non-member never creates an activity entry
        assert_eq!(gate.tracked_clients(), 0);

        assert!(gate.evaluate("9.9.9.9", 1000).is_admitted());
        // Members are still rate limited
        assert!(!gate.evaluate("9.9.9.9", 1000).is_admitted());
    }

    #[test]
    fn test_whitelist_denial_regardless_of_occupancy() {
        let gate = AdmissionGate::new(20, 10, Some(AllowList::new(["9.9.9.9"])));

        // Even with a completely empty window, non-members always get the
        // same denial.
        for _ in 0..3 {
            assert_eq!(
                gate.evaluate("1.1.1.1", 1000),
                Decision::Denied(DenyReason::NotWhitelisted)
            );
        }
    }

    #[test]
    fn test_cleanup_evicts_stale_clients() {
        let gate = open_gate(10, 10);

        gate.evaluate("1.2.3.4", 1000);
        gate.evaluate("5.6.7.8", 1000);
        gate.evaluate("9.9.9.9", 1005);
        assert_eq!(gate.tracked_clients(), 3);

        gate.cleanup(1012);
        assert_eq!(gate.tracked_clients(), 1);

        gate.cleanup(1020);
        assert_eq!(gate.tracked_clients(), 0);
    }

    #[test]
    fn test_concurrent_evaluations_respect_capacity() {
        use std::sync::Arc;

        let gate = Arc::new(open_gate(50, 60));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            handles.push(std::thread::spawn(move || {
                let mut admitted = 0u32;
                for _ in 0..25 {
                    if gate.evaluate("1.2.3.4", 1000).is_admitted() {
                        admitted += 1;
                    }
                }
                admitted
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 50);
    }
}
