//! Speed Diagnostics
//!
//! Periodic reporting of a profiler's average. The reporter lives in the
//! surrounding pipeline and reads the profiler on its own timer; the profiler
//! never logs from the real-time path.

mod csv_log;

pub use csv_log::CsvSpeedLog;

use crate::profiler::Profiler;
use crate::time::{self, Nanoseconds, MILLISECOND};
use serde::Serialize;

/// Lets an event through at most once per period
#[derive(Debug, Clone)]
pub struct RateLimiter {
    period: Nanoseconds,
    next_allowed: Option<Nanoseconds>,
}

impl RateLimiter {
    /// Create a limiter; a non-positive period allows every call
    pub fn new(period: Nanoseconds) -> Self {
        RateLimiter {
            period,
            next_allowed: None,
        }
    }

    /// Check against the current monotonic time
    pub fn allow(&mut self) -> bool {
        self.allow_at(time::timestamp())
    }

    /// Check against an explicit timestamp
    pub fn allow_at(&mut self, now: Nanoseconds) -> bool {
        match self.next_allowed {
            Some(next) if now < next => false,
            _ => {
                self.next_allowed = Some(now.saturating_add(self.period));
                true
            }
        }
    }
}

/// One emitted speed report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedRecord {
    /// Name of the profiled stage
    pub stage: String,
    /// Milliseconds since the reporter was created
    pub elapsed_ms: u64,
    /// Average speed in samples per second per channel
    pub average_speed: f64,
    /// Buckets behind the average
    pub completed_buckets: usize,
}

/// Rate-limited reporter for one pipeline stage
#[derive(Debug, Clone)]
pub struct SpeedReporter {
    stage: String,
    limiter: RateLimiter,
    started: Nanoseconds,
}

impl SpeedReporter {
    /// Create a reporter for `stage`, emitting at most once per `period`
    pub fn new(stage: impl Into<String>, period: Nanoseconds) -> Self {
        SpeedReporter {
            stage: stage.into(),
            limiter: RateLimiter::new(period),
            started: time::timestamp(),
        }
    }

    /// Log the profiler's average if the period has passed
    pub fn report(&mut self, profiler: &Profiler) -> Option<SpeedRecord> {
        if !self.limiter.allow() {
            return None;
        }
        Some(self.report_now(profiler))
    }

    /// Log the profiler's average unconditionally
    pub fn report_now(&self, profiler: &Profiler) -> SpeedRecord {
        let record = self.snapshot(profiler);
        tracing::info!(
            stage = %record.stage,
            avg_speed = format_args!("{:.1}", record.average_speed),
            buckets = record.completed_buckets,
            "profiler: average speed"
        );
        record
    }

    fn snapshot(&self, profiler: &Profiler) -> SpeedRecord {
        let elapsed = (time::timestamp() - self.started).max(0);
        SpeedRecord {
            stage: self.stage.clone(),
            elapsed_ms: (elapsed / MILLISECOND) as u64,
            average_speed: profiler.current_average(),
            completed_buckets: profiler.completed_buckets(),
        }
    }
}
