//! # Time helpers
//!
//! Millisecond clock used by the limiters, and the seconds-until-retry
//! arithmetic behind the denial message.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// Wall-clock epoch milliseconds captured once at first use, advanced by a
// monotonic Instant so a system clock jump cannot reorder window timestamps.
static START_TIME_BASE: OnceLock<(Instant, u64)> = OnceLock::new();

/// Returns the current time in milliseconds since UNIX epoch.
///
/// Monotonic within a process.
///
/// ```rust
/// use leadgate::current_time_ms;
///
/// let a = current_time_ms();
/// let b = current_time_ms();
/// assert!(b >= a);
/// ```
#[inline]
pub fn current_time_ms() -> u64 {
    let (start, base_ms) = START_TIME_BASE.get_or_init(|| {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        (Instant::now(), epoch_ms)
    });
    base_ms.saturating_add(start.elapsed().as_millis() as u64)
}

/// Whole seconds from `now_ms` until `reset_ms`, rounded up.
///
/// A reset instant already in the past yields 0.
///
/// ```rust
/// use leadgate::seconds_until;
///
/// assert_eq!(seconds_until(10_001, 9_000), 2);
/// assert_eq!(seconds_until(10_000, 9_000), 1);
/// assert_eq!(seconds_until(5_000, 9_000), 0);
/// ```
#[inline]
pub fn seconds_until(reset_ms: u64, now_ms: u64) -> u64 {
    reset_ms.saturating_sub(now_ms).div_ceil(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_monotonicity() {
        let mut last = 0;
        for _ in 0..10 {
            let now = current_time_ms();
            assert!(now >= last);
            last = now;
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }

    #[test]
    fn test_time_is_epoch_based() {
        // Any date after 2020-01-01.
        assert!(current_time_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_seconds_until_rounds_up() {
        assert_eq!(seconds_until(1_000, 0), 1);
        assert_eq!(seconds_until(1_001, 0), 2);
        assert_eq!(seconds_until(60_000, 1), 60);
        assert_eq!(seconds_until(0, 0), 0);
        assert_eq!(seconds_until(0, u64::MAX), 0);
    }
}
