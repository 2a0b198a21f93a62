//! Profiled Pipeline
//!
//! Wires a frame source to a sink through a [`ConcurrentQueue`], profiling
//! the hand-off with a [`ProfilingWriter`]:
//!
//! ```text
//! WavSource -> ProfilingWriter<QueueWriter> -> ConcurrentQueue -> consumer thread -> sink
//!                    |                                                  |
//!               SpeedReporter (producer timer)                SpeedGauge (backlog warnings)
//! ```

use crate::audio::{Frame, FrameWriter, Sample};
use crate::queue::ConcurrentQueue;
use crate::time::{self, Nanoseconds, MICROSECOND};
use crate::{ProfilerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sleep between retries while the queue is over its limit
pub const QUEUE_BACKOFF: Nanoseconds = 500 * MICROSECOND;

/// Pipeline settings, loadable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Name used in speed reports
    pub stage_name: String,
    /// Duration of one frame read from the source
    pub frame_length_ms: u64,
    /// Profiler averaging window
    pub window_ms: u64,
    /// Minimum time between speed reports
    pub report_interval_ms: u64,
    /// Producer waits while this many frames are queued
    pub max_queued_frames: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            stage_name: "writer".to_string(),
            frame_length_ms: 10,
            window_ms: 1000,
            report_interval_ms: 1000,
            max_queued_frames: 64,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| ProfilerError::Config(format!("{}: {e}", path.display())))
    }
}

/// Frame writer that copies frames into a shared queue
///
/// Applies back-pressure: while `max_queued` frames are pending the write
/// sleeps and retries, so the profiled time includes the consumer's pace.
pub struct QueueWriter {
    queue: Arc<ConcurrentQueue<Vec<Sample>>>,
    max_queued: usize,
    /// Set by the consumer when it stops draining
    consumer_stopped: Arc<AtomicBool>,
}

impl QueueWriter {
    /// Write into `queue`, waiting while it holds `max_queued` frames
    pub fn new(
        queue: Arc<ConcurrentQueue<Vec<Sample>>>,
        max_queued: usize,
        consumer_stopped: Arc<AtomicBool>,
    ) -> Self {
        QueueWriter {
            queue,
            max_queued: max_queued.max(1),
            consumer_stopped,
        }
    }
}

impl FrameWriter for QueueWriter {
    fn write(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        while self.queue.len() >= self.max_queued {
            if self.consumer_stopped.load(Ordering::Acquire) {
                return Err(ProfilerError::Other("queue consumer stopped".into()));
            }
            std::thread::sleep(time::to_duration(QUEUE_BACKOFF));
        }

        self.queue.write(Some(frame.samples().to_vec()));
        Ok(())
    }
}

#[cfg(feature = "wav")]
pub use run::{run_pipeline, PipelineSummary};

#[cfg(feature = "wav")]
mod run {
    use super::{PipelineConfig, QueueWriter};
    use crate::audio::{Frame, FrameReader, FrameWriter, NullWriter, ProfilingWriter, Sample};
    use crate::diagnostics::{RateLimiter, SpeedRecord, SpeedReporter};
    use crate::profiler::{ProfilerConfig, SpeedGauge};
    use crate::queue::ConcurrentQueue;
    use crate::sndio::{SourceConfig, WavSink, WavSource};
    use crate::time::{Nanoseconds, MILLISECOND};
    use crate::{ProfilerError, Result};
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    /// Totals from one pipeline run
    #[derive(Debug, Clone, PartialEq)]
    pub struct PipelineSummary {
        /// Frames handed to the sink
        pub frames: u64,
        /// Sample-units handed to the sink
        pub samples: u64,
        /// Final average speed of the profiled hand-off
        pub average_speed: f64,
    }

    enum OutputSink {
        Wav(WavSink),
        Null(NullWriter),
    }

    impl OutputSink {
        fn finish(self) -> Result<()> {
            match self {
                OutputSink::Wav(sink) => sink.finalize(),
                OutputSink::Null(_) => Ok(()),
            }
        }
    }

    impl FrameWriter for OutputSink {
        fn write(&mut self, frame: &mut Frame<'_>) -> Result<()> {
            match self {
                OutputSink::Wav(sink) => sink.write(frame),
                OutputSink::Null(sink) => sink.write(frame),
            }
        }
    }

    /// Zeroed buffer for one source frame, failing instead of aborting
    fn frame_buffer(len: usize) -> Result<Vec<Sample>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|e| {
            ProfilerError::Allocation(format!("can't allocate {len} sample frame: {e}"))
        })?;
        buf.resize(len, 0.0);
        Ok(buf)
    }

    fn ms(value: u64) -> Nanoseconds {
        Nanoseconds::try_from(value)
            .unwrap_or(Nanoseconds::MAX)
            .saturating_mul(MILLISECOND)
    }

    /// Stream `input` through a profiled queue into `output` (or discard it)
    ///
    /// `on_report` receives every rate-limited speed report plus a final one.
    pub fn run_pipeline(
        input: &Path,
        output: Option<&Path>,
        config: &PipelineConfig,
        mut on_report: impl FnMut(&SpeedRecord) -> Result<()>,
    ) -> Result<PipelineSummary> {
        let spec = hound::WavReader::open(input)?.spec();
        let num_channels = spec.channels as usize;

        let mut source = WavSource::new(SourceConfig::new(
            num_channels,
            spec.sample_rate,
            ms(config.frame_length_ms),
        ))?;
        source.open(input)?;

        let profiler_config =
            ProfilerConfig::new(num_channels, spec.sample_rate as usize, ms(config.window_ms));

        let mut sink = match output {
            Some(path) => OutputSink::Wav(WavSink::create(path, spec.channels, spec.sample_rate)?),
            None => OutputSink::Null(NullWriter::new()),
        };

        let queue: Arc<ConcurrentQueue<Vec<Sample>>> = Arc::new(ConcurrentQueue::new());
        let consumer_stopped = Arc::new(AtomicBool::new(false));
        let gauge = SpeedGauge::new();

        let mut writer = ProfilingWriter::new(
            QueueWriter::new(
                Arc::clone(&queue),
                config.max_queued_frames,
                Arc::clone(&consumer_stopped),
            ),
            profiler_config,
        )?
        .with_gauge(gauge.clone());

        let consumer = {
            let queue = Arc::clone(&queue);
            let stopped = Arc::clone(&consumer_stopped);
            let backlog_limit = config.max_queued_frames.max(1);
            let report_period = ms(config.report_interval_ms);

            thread::spawn(move || -> Result<OutputSink> {
                let mut limiter = RateLimiter::new(report_period);
                let result = loop {
                    let Some(mut samples) = queue.read() else {
                        break Ok(());
                    };
                    let backlog = queue.len();
                    if backlog + 1 >= backlog_limit && limiter.allow() {
                        tracing::warn!(
                            backlog,
                            producer_speed = gauge.load(),
                            "pipeline: sink falling behind"
                        );
                    }
                    if let Err(err) = sink.write(&mut Frame::new(&mut samples)) {
                        break Err(err);
                    }
                };
                stopped.store(true, Ordering::Release);
                result.map(|()| sink)
            })
        };

        let mut reporter =
            SpeedReporter::new(config.stage_name.clone(), ms(config.report_interval_ms));
        let mut frames = 0u64;
        let mut samples = 0u64;
        let mut buf = frame_buffer(source.frame_size())?;

        let produced = (|| -> Result<()> {
            while source.read(&mut Frame::new(&mut buf))? {
                writer.write(&mut Frame::new(&mut buf))?;
                frames += 1;
                samples += buf.len() as u64;

                if let Some(record) = reporter.report(writer.profiler()) {
                    on_report(&record)?;
                }
            }
            Ok(())
        })();

        // Wake the consumer even if the producer failed
        queue.write(None);
        let consumed = consumer
            .join()
            .map_err(|_| ProfilerError::Other("consumer thread panicked".into()))?;

        // A sink failure also fails the producer; report the sink's error
        let sink = consumed?;
        produced?;
        sink.finish()?;

        let last = reporter.report_now(writer.profiler());
        on_report(&last)?;

        tracing::debug!(frames, samples, "pipeline: finished");

        Ok(PipelineSummary {
            frames,
            samples,
            average_speed: writer.profiler().current_average(),
        })
    }

}
