//! # Sliding Window Limiter
//!
//! Per-key timestamp log. Each key keeps the instants of its admitted calls
//! that are still inside the trailing window; a call is admitted while that
//! log holds fewer than `max_requests` entries.
//!
//! ```text
//!     max_requests = 3, window = 1000ms
//!
//!     t=0    admit   [0]
//!     t=10   admit   [0, 10]
//!     t=20   admit   [0, 10, 20]
//!     t=30   deny    [0, 10, 20]        (not recorded)
//!     t=1005 admit   [10, 20, 1005]     (0 pruned)
//! ```
//!
//! Unlike a fixed bucket, two bursts straddling a bucket edge cannot let
//! `2 × max_requests` calls through inside one window length.
//!
//! ## Concurrency
//!
//! Windows live in a sharded [`DashMap`]. Every prune-check-append runs while
//! holding that key's entry guard, so concurrent calls for the same key are
//! serialized and the budget is never overshot.

use super::{
    config::{RateLimiterConfig, DEFAULT_RETRY_AFTER_SECS},
    metrics::LimiterMetrics,
    utils::{current_time_ms, seconds_until},
};
use crate::error::ConfigError;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Upper bound on the per-key deque preallocation.
const MAX_PREALLOCATED_SLOTS: usize = 64;

/// Sliding-window rate limiter keyed by caller identity.
///
/// ## Example
///
/// ```rust
/// use leadgate::{RateLimiterConfig, SlidingWindowLimiter};
///
/// let limiter = SlidingWindowLimiter::new(RateLimiterConfig::new(3, 1_000));
///
/// assert!(limiter.is_allowed_at("u1", 0));
/// assert!(limiter.is_allowed_at("u1", 1));
/// assert!(limiter.is_allowed_at("u1", 2));
/// assert!(!limiter.is_allowed_at("u1", 3));
///
/// // A different identity has its own window.
/// assert!(limiter.is_allowed_at("u2", 3));
///
/// // Once the first call leaves the window a slot frees up.
/// assert!(limiter.is_allowed_at("u1", 1_001));
/// ```
pub struct SlidingWindowLimiter {
    /// Admitted-call timestamps per key, oldest first.
    windows: DashMap<String, VecDeque<u64>, ahash::RandomState>,

    max_requests: u32,
    window_ms: u64,

    total_admitted: AtomicU64,
    total_denied: AtomicU64,
}

impl SlidingWindowLimiter {
    /// Creates a limiter from a configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (see
    /// [`RateLimiterConfig::validate`]). Use [`try_new`](Self::try_new) to
    /// handle the error instead.
    pub fn new(config: RateLimiterConfig) -> Self {
        match Self::try_new(config) {
            Ok(limiter) => limiter,
            Err(err) => panic!("invalid rate limiter configuration: {err}"),
        }
    }

    /// Creates a limiter, rejecting invalid configurations.
    pub fn try_new(config: RateLimiterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            windows: DashMap::with_hasher(ahash::RandomState::new()),
            max_requests: config.max_requests,
            window_ms: config.window_ms,
            total_admitted: AtomicU64::new(0),
            total_denied: AtomicU64::new(0),
        })
    }

    /// The configuration this limiter enforces.
    pub fn config(&self) -> RateLimiterConfig {
        RateLimiterConfig::new(self.max_requests, self.window_ms)
    }

    /// Admits or denies one call for `key` at the current time.
    ///
    /// Admitted calls are recorded; denied calls are not.
    #[inline]
    pub fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, current_time_ms())
    }

    /// Admits or denies one call for `key` at `now_ms`.
    pub fn is_allowed_at(&self, key: &str, now_ms: u64) -> bool {
        // Fast path: existing window, no key allocation.
        let admitted = match self.windows.get_mut(key) {
            Some(mut window) => self.admit(&mut window, now_ms),
            None => {
                let mut window = self.windows.entry(key.to_owned()).or_insert_with(|| {
                    debug!(key, "created rate window");
                    VecDeque::with_capacity((self.max_requests as usize).min(MAX_PREALLOCATED_SLOTS))
                });
                self.admit(&mut window, now_ms)
            }
        };

        if admitted {
            self.total_admitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_denied.fetch_add(1, Ordering::Relaxed);
            debug!(
                key,
                max_requests = self.max_requests,
                window_ms = self.window_ms,
                "rate limit denied"
            );
        }
        admitted
    }

    /// Prunes expired entries, then records `now_ms` if a slot is free.
    #[inline]
    fn admit(&self, window: &mut VecDeque<u64>, now_ms: u64) -> bool {
        window.retain(|&ts| self.in_window(ts, now_ms));
        if window.len() < self.max_requests as usize {
            window.push_back(now_ms);
            true
        } else {
            false
        }
    }

    /// A timestamp counts while `now - ts < window`.
    #[inline]
    fn in_window(&self, ts: u64, now_ms: u64) -> bool {
        ts.saturating_add(self.window_ms) > now_ms
    }

    /// Calls `key` could still make in the current window.
    #[inline]
    pub fn remaining_requests(&self, key: &str) -> u32 {
        self.remaining_requests_at(key, current_time_ms())
    }

    /// Calls `key` could still make in the window ending at `now_ms`.
    ///
    /// Read-only: expired entries are ignored but not removed.
    pub fn remaining_requests_at(&self, key: &str, now_ms: u64) -> u32 {
        let used = self.windows.get(key).map_or(0, |window| {
            window.iter().filter(|&&ts| self.in_window(ts, now_ms)).count()
        });
        (self.max_requests as usize).saturating_sub(used) as u32
    }

    /// Earliest instant (epoch ms) at which a slot for `key` frees up.
    #[inline]
    pub fn reset_time(&self, key: &str) -> Option<u64> {
        self.reset_time_at(key, current_time_ms())
    }

    /// Earliest in-window timestamp for `key` plus the window length.
    ///
    /// `None` when `key` has no admitted call inside the window ending at
    /// `now_ms`.
    pub fn reset_time_at(&self, key: &str, now_ms: u64) -> Option<u64> {
        self.windows.get(key).and_then(|window| {
            window
                .iter()
                .copied()
                .filter(|&ts| self.in_window(ts, now_ms))
                .min()
                .map(|oldest| oldest.saturating_add(self.window_ms))
        })
    }

    /// Seconds a denied caller should wait before retrying.
    #[inline]
    pub fn retry_after_secs(&self, key: &str) -> u64 {
        self.retry_after_secs_at(key, current_time_ms())
    }

    /// `ceil((reset − now) / 1000)`, or
    /// [`DEFAULT_RETRY_AFTER_SECS`] when no reset time is known.
    ///
    /// This is an estimate. Another call may take the freed slot first.
    pub fn retry_after_secs_at(&self, key: &str, now_ms: u64) -> u64 {
        self.reset_time_at(key, now_ms)
            .map_or(DEFAULT_RETRY_AFTER_SECS, |reset| seconds_until(reset, now_ms))
    }

    /// Number of keys that own a window.
    #[inline]
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> LimiterMetrics {
        LimiterMetrics {
            total_admitted: self.total_admitted.load(Ordering::Relaxed),
            total_denied: self.total_denied.load(Ordering::Relaxed),
            tracked_keys: self.tracked_keys(),
            max_requests: self.max_requests,
            window_ms: self.window_ms,
        }
    }

    /// Drops every window and resets the counters.
    pub fn clear(&self) {
        let count = self.windows.len();
        self.windows.clear();
        self.total_admitted.store(0, Ordering::Relaxed);
        self.total_denied.store(0, Ordering::Relaxed);
        info!("Cleared {} rate windows", count);
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("max_requests", &self.max_requests)
            .field("window_ms", &self.window_ms)
            .field("tracked_keys", &self.tracked_keys())
            .finish()
    }
}
