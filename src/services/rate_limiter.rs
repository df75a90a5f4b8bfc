//! Per-client sliding-window admission control.
//!
//! # Algorithm
//!
//! Each client key owns the timestamps of its admitted requests. On every
//! call the timestamps older than the window are dropped; if the remaining
//! count has reached the ceiling the request is refused without being
//! recorded, otherwise "now" is appended and the request is admitted.
//!
//! Per-client counts are small (the ceiling is typically 10), so filtering a
//! short `Vec` is cheaper and simpler than a ring buffer.
//!
//! # Memory Bound
//!
//! The registry grows with the number of distinct clients. Once it holds more
//! than `max_clients` keys, the next call sweeps out every key whose newest
//! timestamp has left the window. Clients with live history are never
//! touched, so a flood of distinct addresses cannot reset the quota of
//! anybody else.
//!
//! # Concurrency
//!
//! A single mutex guards the whole registry. Both the per-key
//! check-then-append and the sweep run under it, so two concurrent requests
//! can never both observe "below the ceiling" for the same key. Nothing is
//! awaited while the lock is held.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Limits for one [`SlidingWindowLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Admissions allowed per client within one window.
    pub max_requests: usize,
    /// Length of the trailing window.
    pub window: Duration,
    /// Registry size above which stale clients are swept.
    pub max_clients: usize,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
            max_clients: 10_000,
        }
    }
}

/// In-memory, instance-local sliding-window rate limiter keyed by client.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    policy: RateLimitPolicy,
    log: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            log: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Decide whether `client` may make another request now.
    pub fn admit(&self, client: &str) -> bool {
        self.admit_at(client, Instant::now())
    }

    /// [`admit`](Self::admit) against an explicit clock reading.
    pub fn admit_at(&self, client: &str, now: Instant) -> bool {
        let window = self.policy.window;
        let in_window = |t: &Instant| now.saturating_duration_since(*t) < window;

        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);

        if log.len() > self.policy.max_clients {
            let before = log.len();
            // Timestamps are appended in order, so the newest one decides.
            log.retain(|_, stamps| stamps.last().is_some_and(in_window));
            info!(
                before,
                after = log.len(),
                "Compacted rate limit registry"
            );
        }

        let stamps = log.entry(client.to_string()).or_default();
        stamps.retain(in_window);

        if stamps.len() >= self.policy.max_requests {
            debug!(client, count = stamps.len(), "Client over rate limit");
            return false;
        }

        stamps.push(now);
        true
    }

    /// Number of client keys currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn policy(max_requests: usize, window_secs: u64, max_clients: usize) -> RateLimitPolicy {
        RateLimitPolicy {
            max_requests,
            window: Duration::from_secs(window_secs),
            max_clients,
        }
    }

    #[test]
    fn test_ceiling_then_reject() {
        let limiter = SlidingWindowLimiter::default();
        let start = Instant::now();

        for i in 0..10 {
            assert!(
                limiter.admit_at("203.0.113.7", start + Duration::from_millis(i)),
                "request {i} should be admitted"
            );
        }
        assert!(!limiter.admit_at("203.0.113.7", start + Duration::from_secs(1)));
    }

    #[test]
    fn test_admitted_again_after_window_elapses() {
        let limiter = SlidingWindowLimiter::new(policy(3, 60, 100));
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.admit_at("client", start));
        }
        assert!(!limiter.admit_at("client", start + Duration::from_secs(59)));
        assert!(limiter.admit_at("client", start + Duration::from_secs(60)));
    }

    #[test]
    fn test_rejected_attempts_are_not_recorded() {
        let limiter = SlidingWindowLimiter::new(policy(2, 60, 100));
        let start = Instant::now();

        assert!(limiter.admit_at("client", start));
        assert!(limiter.admit_at("client", start));
        // Hammering while limited must not extend the lockout
        for s in 1..60 {
            assert!(!limiter.admit_at("client", start + Duration::from_secs(s)));
        }
        assert!(limiter.admit_at("client", start + Duration::from_secs(60)));
    }

    #[test]
    fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new(policy(2, 10, 100));
        let start = Instant::now();

        assert!(limiter.admit_at("client", start));
        assert!(limiter.admit_at("client", start + Duration::from_secs(5)));
        assert!(!limiter.admit_at("client", start + Duration::from_secs(9)));
        // The first stamp leaves the window, the second is still inside it
        assert!(limiter.admit_at("client", start + Duration::from_secs(10)));
        assert!(!limiter.admit_at("client", start + Duration::from_secs(14)));
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = SlidingWindowLimiter::new(policy(1, 60, 100));
        let now = Instant::now();

        assert!(limiter.admit_at("a", now));
        assert!(!limiter.admit_at("a", now));
        assert!(limiter.admit_at("b", now));
        assert!(limiter.admit_at("unknown", now));
    }

    #[test]
    fn test_compaction_removes_only_stale_clients() {
        let limiter = SlidingWindowLimiter::new(policy(2, 60, 3));
        let start = Instant::now();

        // An active client with history close to the ceiling
        assert!(limiter.admit_at("active", start + Duration::from_secs(30)));

        // Stale clients from long ago
        for key in ["old-1", "old-2", "old-3"] {
            assert!(limiter.admit_at(key, start));
        }
        assert_eq!(limiter.tracked_clients(), 4);

        // Over the high-water mark: the next call sweeps
        let later = start + Duration::from_secs(70);
        assert!(limiter.admit_at("active", later));
        assert_eq!(limiter.tracked_clients(), 1);

        // The active client kept its history and is now at the ceiling
        assert!(!limiter.admit_at("active", later));
    }

    #[test]
    fn test_no_compaction_at_or_below_high_water_mark() {
        let limiter = SlidingWindowLimiter::new(policy(5, 60, 3));
        let start = Instant::now();

        for key in ["a", "b", "c"] {
            assert!(limiter.admit_at(key, start));
        }
        assert!(limiter.admit_at("a", start + Duration::from_secs(120)));
        assert_eq!(limiter.tracked_clients(), 3);
    }

    #[test]
    fn test_concurrent_admission_never_exceeds_ceiling() {
        let limiter = Arc::new(SlidingWindowLimiter::new(policy(10, 60, 100)));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..25).filter(|_| limiter.admit_at("shared", now)).count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 10);
    }
}
