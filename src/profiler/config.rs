//! Profiler configuration
//!
//! Turns the three construction scalars (channels, sample rate, window) into
//! the fixed bucket geometry used by the estimator.

use super::BUCKET_DURATION;
use crate::audio::ChannelMask;
use crate::time::{Nanoseconds, SECOND};
use crate::{ProfilerError, Result};
use serde::{Deserialize, Serialize};

/// Construction parameters for a [`Profiler`](super::Profiler)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// Number of interleaved channels in each frame
    pub num_channels: usize,
    /// Samples per second, per channel
    pub sample_rate: usize,
    /// Length of the trailing averaging window
    pub interval: Nanoseconds,
}

/// Bucket geometry derived from a valid [`ProfilerConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketLayout {
    /// Sample-units (all channels) needed to fill one bucket
    pub bucket_capacity: usize,
    /// Number of buckets in the ring
    pub ring_length: usize,
}

impl ProfilerConfig {
    /// Create a configuration from a raw channel count
    pub fn new(num_channels: usize, sample_rate: usize, interval: Nanoseconds) -> Self {
        ProfilerConfig {
            num_channels,
            sample_rate,
            interval,
        }
    }

    /// Create a configuration from a channel mask
    pub fn from_channel_mask(
        channels: ChannelMask,
        sample_rate: usize,
        interval: Nanoseconds,
    ) -> Self {
        Self::new(channels.num_channels(), sample_rate, interval)
    }

    /// Check the parameters and derive the bucket layout
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::InvalidConfig`] if:
    /// - the channel count or sample rate is 0
    /// - one bucket would hold no samples (or would overflow `usize`)
    /// - the window is shorter than one bucket
    pub fn validate(&self) -> Result<BucketLayout> {
        if self.num_channels == 0 {
            return Err(ProfilerError::InvalidConfig("number of channels is zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(ProfilerError::InvalidConfig("sample rate is zero".into()));
        }

        let bucket_capacity =
            samples_per_duration(self.sample_rate, self.num_channels, BUCKET_DURATION)
                .ok_or_else(|| {
                    ProfilerError::InvalidConfig(format!(
                        "bucket size overflows: sample_rate={} channels={}",
                        self.sample_rate, self.num_channels
                    ))
                })?;
        if bucket_capacity == 0 {
            return Err(ProfilerError::InvalidConfig(format!(
                "sample rate {} is too low to fill a {}ms bucket",
                self.sample_rate,
                BUCKET_DURATION / crate::time::MILLISECOND
            )));
        }

        let ring_length = if self.interval > 0 {
            (self.interval / BUCKET_DURATION) as usize
        } else {
            0
        };
        if ring_length == 0 {
            return Err(ProfilerError::InvalidConfig(format!(
                "window of {}ns is shorter than one {}ns bucket",
                self.interval, BUCKET_DURATION
            )));
        }

        Ok(BucketLayout {
            bucket_capacity,
            ring_length,
        })
    }

    /// Whether [`validate`](Self::validate) would succeed
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Interleaved sample-units produced in `duration` (rounded down)
fn samples_per_duration(
    sample_rate: usize,
    num_channels: usize,
    duration: Nanoseconds,
) -> Option<usize> {
    let total = (sample_rate as u128)
        .checked_mul(num_channels as u128)?
        .checked_mul(duration.max(0) as u128)?
        / SECOND as u128;
    usize::try_from(total).ok()
}
