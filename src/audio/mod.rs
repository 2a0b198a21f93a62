//! Audio Frames and Pipeline Seams
//!
//! A [`Frame`] is a borrowed block of interleaved samples. Pipeline stages
//! push frames through [`FrameWriter`]s and pull them from [`FrameReader`]s.

mod channel_mask;
mod profiling_writer;

pub use channel_mask::ChannelMask;
pub use profiling_writer::ProfilingWriter;

use crate::Result;

/// Audio sample (normalized to -1.0..1.0)
pub type Sample = f32;

/// Block of interleaved samples borrowed from the caller
#[derive(Debug)]
pub struct Frame<'a> {
    samples: &'a mut [Sample],
}

impl<'a> Frame<'a> {
    /// Wrap a sample buffer
    pub fn new(samples: &'a mut [Sample]) -> Self {
        Frame { samples }
    }

    /// Number of sample-units (all channels)
    pub fn size(&self) -> usize {
        self.samples.len()
    }

    /// Whether the frame holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Read access to the samples
    pub fn samples(&self) -> &[Sample] {
        self.samples
    }

    /// Write access to the samples
    pub fn samples_mut(&mut self) -> &mut [Sample] {
        self.samples
    }
}

/// Sink side of a pipeline stage
pub trait FrameWriter {
    /// Consume one frame
    fn write(&mut self, frame: &mut Frame<'_>) -> Result<()>;
}

/// Source side of a pipeline stage
pub trait FrameReader {
    /// Fill `frame`; `Ok(false)` when nothing was produced (paused or exhausted)
    fn read(&mut self, frame: &mut Frame<'_>) -> Result<bool>;
}

impl<W: FrameWriter + ?Sized> FrameWriter for Box<W> {
    fn write(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        (**self).write(frame)
    }
}

/// Writer that drops every frame, counting what it saw
#[derive(Debug, Default, Clone)]
pub struct NullWriter {
    frames: u64,
    samples: u64,
}

impl NullWriter {
    /// Create a writer with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames written so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Sample-units written so far
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl FrameWriter for NullWriter {
    fn write(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        self.frames += 1;
        self.samples += frame.size() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_views() {
        let mut buf = vec![0.0; 4];
        let mut frame = Frame::new(&mut buf);
        assert_eq!(frame.size(), 4);
        assert!(!frame.is_empty());

        frame.samples_mut()[2] = 0.5;
        assert_eq!(frame.samples(), &[0.0, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn test_null_writer_counts() {
        let mut writer: Box<dyn FrameWriter> = Box::new(NullWriter::new());
        let mut buf = vec![0.0; 32];
        writer.write(&mut Frame::new(&mut buf)).unwrap();
        writer.write(&mut Frame::new(&mut buf[..8])).unwrap();

        let mut counted = NullWriter::new();
        counted.write(&mut Frame::new(&mut buf)).unwrap();
        counted.write(&mut Frame::new(&mut buf[..8])).unwrap();
        assert_eq!(counted.frames(), 2);
        assert_eq!(counted.samples(), 40);
    }
}
