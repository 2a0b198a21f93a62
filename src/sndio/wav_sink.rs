//! WAV file frame sink (32-bit float)

use crate::audio::{Frame, FrameWriter};
use crate::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Frame writer producing a 32-bit float WAV file
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    samples_written: u64,
}

impl WavSink {
    /// Create (or truncate) `path`
    pub fn create(path: impl AsRef<Path>, num_channels: u16, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: num_channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        tracing::info!(output = %path.as_ref().display(), "wav sink: creating");
        let writer = WavWriter::create(path, spec)?;

        Ok(WavSink {
            writer,
            samples_written: 0,
        })
    }

    /// Sample-units written so far
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Write the final header; dropping without this loses the error
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl FrameWriter for WavSink {
    fn write(&mut self, frame: &mut Frame<'_>) -> Result<()> {
        for &sample in frame.samples() {
            self.writer.write_sample(sample)?;
        }
        self.samples_written += frame.size() as u64;
        Ok(())
    }
}
