//! Throughput profiler for real-time audio pipelines
//!
//! Reports the moving-average processing speed (samples per second, per
//! channel) of a pipeline stage over a trailing window, with O(1) work and no
//! heap allocation per frame.
//!
//! The window is split into 10 ms buckets held in a fixed ring. Each bucket
//! stores the weighted mean speed of the frames that filled it, where a
//! frame's weight is the share of the bucket its samples occupy. While the
//! ring is filling the reported value is the cumulative mean of all finished
//! buckets; once full it becomes a sliding mean over the last `N` buckets,
//! maintained with an incremental running sum.
//!
//! # Crate feature flags
//! - `wav` (default): WAV file source and sink (`sndio`) backed by `hound`
//!
//! # Quick start
//! ```
//! use audio_profiler::{Profiler, ProfilerConfig, time};
//! let config = ProfilerConfig::new(2, 48_000, time::SECOND);
//! let mut profiler = Profiler::new(config).unwrap();
//! profiler.add_frame(960, time::MILLISECOND);
//! let speed = profiler.current_average();
//! assert!(speed > 0.0);
//! ```
//!
//! ## Profiling a writer
//! ```
//! use audio_profiler::audio::{Frame, FrameWriter, NullWriter, ProfilingWriter};
//! use audio_profiler::{ProfilerConfig, time};
//! let config = ProfilerConfig::new(1, 44_100, 500 * time::MILLISECOND);
//! let mut writer = ProfilingWriter::new(NullWriter::new(), config).unwrap();
//! let mut samples = vec![0.0f32; 441];
//! writer.write(&mut Frame::new(&mut samples)).unwrap();
//! ```

#![warn(missing_docs)]

pub mod audio; // Frames, writer/reader seams, profiling decorator
pub mod diagnostics; // Rate-limited speed reporting
pub mod pipeline; // Source -> queue -> sink wiring used by the CLI
pub mod profiler; // Moving-average throughput estimator
pub mod queue; // Blocking hand-off between threads
#[cfg(feature = "wav")]
pub mod sndio; // WAV file I/O
pub mod time; // Nanosecond units and timestamps

/// Error types for profiler and pipeline operations
#[derive(thiserror::Error, Debug)]
pub enum ProfilerError {
    /// Rejected construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Fixed storage could not be reserved
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV encoder/decoder error
    #[error("WAV error: {0}")]
    Wav(String),

    /// Frame source misuse or failure
    #[error("Source error: {0}")]
    Source(String),

    /// Pipeline configuration file error
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ProfilerError {
    /// Converts a String into `ProfilerError::Other`.
    ///
    /// Prefer a specific variant when one fits; this conversion loses the
    /// error category.
    fn from(msg: String) -> Self {
        ProfilerError::Other(msg)
    }
}

impl From<&str> for ProfilerError {
    /// Converts a string slice into `ProfilerError::Other`.
    fn from(msg: &str) -> Self {
        ProfilerError::Other(msg.to_string())
    }
}

#[cfg(feature = "wav")]
impl From<hound::Error> for ProfilerError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => ProfilerError::Io(io),
            other => ProfilerError::Wav(other.to_string()),
        }
    }
}

/// Result type for profiler operations
pub type Result<T> = std::result::Result<T, ProfilerError>;

// Public API exports
pub use audio::{ChannelMask, Frame, FrameReader, FrameWriter, ProfilingWriter, Sample};
pub use diagnostics::{RateLimiter, SpeedRecord, SpeedReporter};
pub use profiler::{BucketLayout, Profiler, ProfilerConfig, SpeedGauge, BUCKET_DURATION};
pub use queue::ConcurrentQueue;
#[cfg(feature = "wav")]
pub use sndio::{SourceConfig, WavSink, WavSource};
