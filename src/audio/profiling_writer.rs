//! Timed-write decorator
//!
//! Wraps any [`FrameWriter`], measures how long each write takes and feeds
//! `(frame size, elapsed)` to a [`Profiler`]. The measurement happens on the
//! writing thread right after the write returns, so a frame's contribution is
//! visible as soon as `write` returns.

use super::{Frame, FrameWriter};
use crate::profiler::{Profiler, ProfilerConfig, SpeedGauge};
use crate::time::{self, Nanoseconds};
use crate::Result;

/// Writer decorator that profiles the wrapped writer's speed
#[derive(Debug)]
pub struct ProfilingWriter<W> {
    profiler: Profiler,
    writer: W,
    /// Optional cross-thread snapshot of the average
    gauge: Option<SpeedGauge>,
}

impl<W: FrameWriter> ProfilingWriter<W> {
    /// Wrap `writer`, profiling it with `config`
    ///
    /// # Errors
    ///
    /// Fails if the profiler configuration is invalid.
    pub fn new(writer: W, config: ProfilerConfig) -> Result<Self> {
        Ok(ProfilingWriter {
            profiler: Profiler::new(config)?,
            writer,
            gauge: None,
        })
    }

    /// Publish every new average to `gauge`
    pub fn with_gauge(mut self, gauge: SpeedGauge) -> Self {
        self.gauge = Some(gauge);
        self
    }

    /// The profiler being fed
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// The wrapped writer
    pub fn inner(&self) -> &W {
        &self.writer
    }

    /// The wrapped writer, mutably
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwrap, dropping the profiler
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn timed_write(&mut self, frame: &mut Frame<'_>) -> Result<Nanoseconds> {
        let start = time::timestamp();
        self.writer.write(frame)?;
        Ok(time::timestamp() - start)
    }
}

impl<W: FrameWriter> FrameWriter for ProfilingWriter<W> {
    fn write(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        let elapsed = self.timed_write(frame)?;

        self.profiler.add_frame(frame.size(), elapsed);
        if let Some(gauge) = &self.gauge {
            gauge.publish(self.profiler.current_average());
        }

        Ok(())
    }
}
