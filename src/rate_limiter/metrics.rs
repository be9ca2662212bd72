//! Admission metrics for sliding-window limiters.
//!
//! ```text
//!     LimiterMetrics
//!     ├─ admitted / denied   lifetime counters
//!     ├─ tracked_keys        identities with a window
//!     └─ success_rate        admitted / (admitted + denied)
//! ```

use std::fmt;

/// Snapshot of one limiter's counters.
///
/// ```rust
/// use leadgate::SlidingWindowLimiter;
/// use leadgate::RateLimiterConfig;
///
/// let limiter = SlidingWindowLimiter::new(RateLimiterConfig::new(1, 1_000));
/// limiter.is_allowed("u1");
/// limiter.is_allowed("u1");
///
/// let metrics = limiter.metrics();
/// assert_eq!(metrics.total_admitted, 1);
/// assert_eq!(metrics.total_denied, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterMetrics {
    /// Calls admitted since construction (or the last `clear`).
    pub total_admitted: u64,

    /// Calls denied since construction (or the last `clear`).
    pub total_denied: u64,

    /// Keys that currently own a window.
    pub tracked_keys: usize,

    /// Configured budget per window.
    pub max_requests: u32,

    /// Configured window length.
    pub window_ms: u64,
}

impl LimiterMetrics {
    /// Fraction of calls admitted. 1.0 before any call.
    #[inline]
    pub fn success_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            1.0
        } else {
            self.total_admitted as f64 / total as f64
        }
    }

    /// Fraction of calls denied.
    #[inline]
    pub fn denial_rate(&self) -> f64 {
        1.0 - self.success_rate()
    }

    /// Admitted plus denied.
    #[inline]
    pub fn total_requests(&self) -> u64 {
        self.total_admitted + self.total_denied
    }

    /// More than half of all calls were denied.
    #[inline]
    pub fn is_under_pressure(&self) -> bool {
        self.success_rate() < 0.5
    }

    /// Multi-line report for logs.
    pub fn summary(&self) -> String {
        format!(
            "Limiter Metrics ({} per {}ms):\n\
             ├─ Admitted: {}\n\
             ├─ Denied: {}\n\
             ├─ Success Rate: {:.2}%\n\
             └─ Tracked Keys: {}",
            self.max_requests,
            self.window_ms,
            self.total_admitted,
            self.total_denied,
            self.success_rate() * 100.0,
            self.tracked_keys,
        )
    }
}

impl fmt::Display for LimiterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "admitted={} denied={} keys={} success={:.1}%",
            self.total_admitted,
            self.total_denied,
            self.tracked_keys,
            self.success_rate() * 100.0
        )
    }
}
