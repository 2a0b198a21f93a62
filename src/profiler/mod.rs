//! Moving-Average Throughput Estimator
//!
//! Frames of arbitrary size and duration are cut into fixed 10 ms buckets.
//! Within a bucket each frame's speed is weighted by the share of the bucket
//! its samples fill, so a bucket's value is a weighted mean whose weights sum
//! to exactly one. Finished buckets go into a [`SpeedWindow`].
//!
//! ```text
//!   frame A (30 samples)    frame B (45 samples)
//! |<------------------->|<---------------------------->|
//! |   bucket 0 (cap 50)            |   bucket 1 ...
//!   0.6*A + 0.4*B                    0.5*B + ...
//! ```

mod config;
mod gauge;
mod window;

pub use config::{BucketLayout, ProfilerConfig};
pub use gauge::SpeedGauge;
pub use window::SpeedWindow;

use crate::time::{Nanoseconds, MILLISECOND, SECOND};
use crate::Result;

/// Time span covered by one bucket
pub const BUCKET_DURATION: Nanoseconds = 10 * MILLISECOND;

/// Average processing speed over a trailing window
///
/// Owned and driven by a single pipeline thread. `add_frame` runs in bounded
/// time relative to the frame size and never allocates.
#[derive(Debug, Clone)]
pub struct Profiler {
    config: ProfilerConfig,
    layout: BucketLayout,
    window: SpeedWindow,
    /// Sample-units already in the open bucket (`< bucket_capacity`)
    open_filled: usize,
    /// Weighted speed sum of the open bucket
    open_speed: f64,
    /// Last computed average, 0.0 until the first bucket finishes
    moving_avg: f64,
}

impl Profiler {
    /// Create a profiler, reserving its ring up front
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::InvalidConfig`](crate::ProfilerError::InvalidConfig)
    /// for a degenerate configuration (see [`ProfilerConfig::validate`]) and
    /// [`ProfilerError::Allocation`](crate::ProfilerError::Allocation) if the
    /// ring can't be reserved.
    pub fn new(config: ProfilerConfig) -> Result<Self> {
        let layout = match config.validate() {
            Ok(layout) => layout,
            Err(err) => {
                tracing::warn!(%err, "profiler: rejected configuration");
                return Err(err);
            }
        };

        let window = SpeedWindow::new(layout.ring_length)?;

        tracing::debug!(
            channels = config.num_channels,
            sample_rate = config.sample_rate,
            bucket_capacity = layout.bucket_capacity,
            ring_length = layout.ring_length,
            "profiler: initialized"
        );

        Ok(Profiler {
            config,
            layout,
            window,
            open_filled: 0,
            open_speed: 0.0,
            moving_avg: 0.0,
        })
    }

    /// Account for `frame_size` sample-units processed in `elapsed`
    ///
    /// Frames with no samples or a non-positive elapsed time are ignored, so
    /// the average can never become NaN or infinite.
    pub fn add_frame(&mut self, frame_size: usize, elapsed: Nanoseconds) {
        if frame_size == 0 || elapsed <= 0 {
            return;
        }

        let speed = frame_size as f64 * SECOND as f64
            / elapsed as f64
            / self.config.num_channels as f64;

        let capacity = self.layout.bucket_capacity;
        let mut remaining = frame_size;

        while remaining > 0 {
            let n = (capacity - self.open_filled).min(remaining);

            self.open_speed += n as f64 / capacity as f64 * speed;
            self.open_filled += n;
            remaining -= n;

            if self.open_filled == capacity {
                let value = std::mem::take(&mut self.open_speed);
                self.open_filled = 0;
                self.moving_avg = self.window.push(value);
            }
        }
    }

    /// Latest moving average in samples per second per channel
    ///
    /// Returns 0.0 until the first bucket is complete.
    pub fn current_average(&self) -> f64 {
        self.moving_avg
    }

    /// Buckets finished so far, saturating at the ring length
    pub fn completed_buckets(&self) -> usize {
        self.window.completed()
    }

    /// Whether the average is a sliding mean over the full window
    pub fn is_window_full(&self) -> bool {
        self.window.is_full()
    }

    /// Bucket geometry in use
    pub fn layout(&self) -> BucketLayout {
        self.layout
    }

    /// Configuration the profiler was built with
    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Return to the freshly constructed state without reallocating
    pub fn reset(&mut self) {
        self.window.clear();
        self.open_filled = 0;
        self.open_speed = 0.0;
        self.moving_avg = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProfilerError;
    use approx::assert_relative_eq;

    /// 1 channel at 5 kHz with a 50 ms window: 50 samples per bucket, 5 buckets
    fn reference_profiler() -> Profiler {
        Profiler::new(ProfilerConfig::new(1, 5000, 50 * MILLISECOND)).unwrap()
    }

    #[test]
    fn test_zero_state() {
        let profiler = reference_profiler();
        assert_eq!(profiler.current_average(), 0.0);
        assert_eq!(profiler.completed_buckets(), 0);
        assert!(!profiler.is_window_full());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let err = Profiler::new(ProfilerConfig::new(0, 5000, SECOND)).unwrap_err();
        assert!(matches!(err, ProfilerError::InvalidConfig(_)));
    }

    #[test]
    fn test_single_full_frame() {
        let mut profiler = reference_profiler();
        // 50 samples in 10 ms -> 5000 samples/s
        profiler.add_frame(50, 10 * MILLISECOND);

        assert_eq!(profiler.completed_buckets(), 1);
        assert_relative_eq!(profiler.current_average(), 5000.0);
    }

    #[test]
    fn test_partial_bucket_does_not_report() {
        let mut profiler = reference_profiler();
        profiler.add_frame(49, 10 * MILLISECOND);

        assert_eq!(profiler.completed_buckets(), 0);
        assert_eq!(profiler.current_average(), 0.0);
    }

    #[test]
    fn test_weighted_split() {
        let mut profiler = reference_profiler();
        // 25 samples each; elapsed times differ wildly, weights don't
        profiler.add_frame(25, SECOND); // 25/s
        profiler.add_frame(25, 5 * MILLISECOND); // 5000/s

        assert_eq!(profiler.completed_buckets(), 1);
        assert_relative_eq!(profiler.current_average(), 0.5 * 25.0 + 0.5 * 5000.0);
    }

    #[test]
    fn test_speed_is_per_channel() {
        let mut profiler = Profiler::new(ProfilerConfig::new(2, 5000, 50 * MILLISECOND)).unwrap();
        assert_eq!(profiler.layout().bucket_capacity, 100);

        // 100 interleaved samples = 50 per channel in 10 ms
        profiler.add_frame(100, 10 * MILLISECOND);
        assert_relative_eq!(profiler.current_average(), 5000.0);
    }

    #[test]
    fn test_phase_transition() {
        let mut profiler = reference_profiler();
        let speeds = [1.0, 2.0, 4.0, 5.0, 8.0, 10.0, 20.0];
        let mut finished = Vec::new();

        for &speed in &speeds {
            // One bucket per frame
            let elapsed = (50.0 * SECOND as f64 / speed) as Nanoseconds;
            profiler.add_frame(50, elapsed);
            finished.push(speed);

            let expected = if finished.len() < 5 {
                finished.iter().sum::<f64>() / finished.len() as f64
            } else {
                finished[finished.len() - 5..].iter().sum::<f64>() / 5.0
            };
            assert_relative_eq!(profiler.current_average(), expected, max_relative = 1e-12);
        }

        assert!(profiler.is_window_full());
        assert_eq!(profiler.completed_buckets(), 5);
    }

    #[test]
    fn test_cma_and_sma_agree_at_transition() {
        let mut profiler = reference_profiler();
        for speed in [1.0, 2.0, 4.0, 5.0] {
            profiler.add_frame(50, (50.0 * SECOND as f64 / speed) as Nanoseconds);
        }
        profiler.add_frame(50, 5 * SECOND); // speed 10

        assert!(profiler.is_window_full());
        assert_relative_eq!(profiler.current_average(), (1.0 + 2.0 + 4.0 + 5.0 + 10.0) / 5.0);
    }

    #[test]
    fn test_oversized_frame_finishes_several_buckets() {
        let mut profiler = reference_profiler();
        profiler.add_frame(30, 30 * SECOND); // speed 1, 30 of 50 in bucket 0

        // 20 complete bucket 0, 50 fill bucket 1, 30 stay open
        profiler.add_frame(100, 25 * SECOND); // speed 4
        assert_eq!(profiler.completed_buckets(), 2);

        let bucket0 = 0.6 * 1.0 + 0.4 * 4.0;
        let bucket1 = 4.0;
        assert_relative_eq!(profiler.current_average(), (bucket0 + bucket1) / 2.0);

        // The 30 leftover samples at speed 4 weigh 0.6 in bucket 2
        profiler.add_frame(20, 10 * SECOND); // speed 2
        let bucket2 = 0.6 * 4.0 + 0.4 * 2.0;
        assert_eq!(profiler.completed_buckets(), 3);
        assert_relative_eq!(profiler.current_average(), (bucket0 + bucket1 + bucket2) / 3.0);
    }

    #[test]
    fn test_non_positive_elapsed_is_ignored() {
        let mut profiler = reference_profiler();
        profiler.add_frame(25, 25 * SECOND);
        profiler.add_frame(50, 0);
        profiler.add_frame(50, -SECOND);
        assert_eq!(profiler.completed_buckets(), 0);

        profiler.add_frame(25, 25 * SECOND);
        assert_eq!(profiler.completed_buckets(), 1);
        assert_relative_eq!(profiler.current_average(), 1.0);

        let before = profiler.current_average();
        profiler.add_frame(500, 0);
        assert_eq!(profiler.current_average(), before);
        assert!(profiler.current_average().is_finite());
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut profiler = reference_profiler();
        profiler.add_frame(0, SECOND);
        profiler.add_frame(50, 50 * SECOND);
        profiler.add_frame(0, 1);
        assert_relative_eq!(profiler.current_average(), 1.0);
        assert_eq!(profiler.completed_buckets(), 1);
    }

    #[test]
    fn test_idempotent_read() {
        let mut profiler = reference_profiler();
        profiler.add_frame(75, 30 * SECOND);
        let first = profiler.current_average();
        for _ in 0..10 {
            assert_eq!(profiler.current_average(), first);
        }
    }

    #[test]
    fn test_reset() {
        let mut profiler = reference_profiler();
        profiler.add_frame(260, 13 * SECOND);
        assert!(profiler.is_window_full());

        profiler.reset();
        assert_eq!(profiler.current_average(), 0.0);
        assert_eq!(profiler.completed_buckets(), 0);

        // Leftover open-bucket samples must be gone as well
        profiler.add_frame(50, 50 * SECOND);
        assert_relative_eq!(profiler.current_average(), 1.0);
    }
}
