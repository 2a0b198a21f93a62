//! Time Units
//!
//! Signed nanosecond arithmetic used by the profiler. Elapsed times are signed
//! so that clock hiccups (zero or negative deltas) can be represented and
//! rejected instead of wrapping.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Signed nanosecond count
pub type Nanoseconds = i64;

/// One nanosecond
pub const NANOSECOND: Nanoseconds = 1;
/// One microsecond
pub const MICROSECOND: Nanoseconds = 1_000 * NANOSECOND;
/// One millisecond
pub const MILLISECOND: Nanoseconds = 1_000 * MICROSECOND;
/// One second
pub const SECOND: Nanoseconds = 1_000 * MILLISECOND;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic timestamp in nanoseconds, relative to the first call in this process
pub fn timestamp() -> Nanoseconds {
    let epoch = EPOCH.get_or_init(Instant::now);
    from_duration(epoch.elapsed())
}

/// Convert a [`Duration`] to nanoseconds, saturating at `i64::MAX`
pub fn from_duration(d: Duration) -> Nanoseconds {
    i64::try_from(d.as_nanos()).unwrap_or(Nanoseconds::MAX)
}

/// Convert non-negative nanoseconds to a [`Duration`] (negative values clamp to zero)
pub fn to_duration(ns: Nanoseconds) -> Duration {
    Duration::from_nanos(ns.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_ladder() {
        assert_eq!(SECOND, 1_000_000_000);
        assert_eq!(MILLISECOND * 1_000, SECOND);
    }

    #[test]
    fn test_timestamp_is_monotonic() {
        let a = timestamp();
        let b = timestamp();
        assert!(b >= a);
    }

    #[test]
    fn test_duration_conversion() {
        assert_eq!(from_duration(Duration::from_millis(10)), 10 * MILLISECOND);
        assert_eq!(from_duration(Duration::MAX), Nanoseconds::MAX);
        assert_eq!(to_duration(-5), Duration::ZERO);
        assert_eq!(to_duration(2 * SECOND), Duration::from_secs(2));
    }
}
