//! WAV file frame source
//!
//! Reads fixed-length frames of interleaved samples from a WAV file. Integer
//! PCM is normalized to -1.0..1.0, float PCM is passed through. The file must
//! match the configured channel count and sample rate.

use crate::audio::{Frame, FrameReader, Sample};
use crate::time::{Nanoseconds, SECOND};
use crate::{ProfilerError, Result};
use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Largest frame a source will hand out (512 MB worth of samples)
pub const MAX_FRAME_SIZE: usize = 512 * 1024 * 1024 / std::mem::size_of::<Sample>();

/// Expected stream layout and frame length for a [`WavSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceConfig {
    /// Interleaved channels per frame
    pub num_channels: usize,
    /// Samples per second, per channel
    pub sample_rate: u32,
    /// Duration covered by one frame
    pub frame_length: Nanoseconds,
}

impl SourceConfig {
    /// Create a source configuration
    pub fn new(num_channels: usize, sample_rate: u32, frame_length: Nanoseconds) -> Self {
        SourceConfig {
            num_channels,
            sample_rate,
            frame_length,
        }
    }

    /// Sample-units (all channels) in one frame, `None` on overflow
    pub fn frame_size(&self) -> Option<usize> {
        let per_channel = (self.sample_rate as u128)
            .checked_mul(self.frame_length.max(0) as u128)?
            / SECOND as u128;
        usize::try_from(per_channel).ok()?.checked_mul(self.num_channels)
    }
}

/// Frame source reading from a WAV file
pub struct WavSource {
    config: SourceConfig,
    frame_size: usize,
    path: Option<PathBuf>,
    reader: Option<WavReader<BufReader<File>>>,
    paused: bool,
    eof: bool,
}

impl WavSource {
    /// Create a closed source
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::InvalidConfig`] if the channel count, frame
    /// length or resulting frame size is zero, or if the frame size exceeds
    /// [`MAX_FRAME_SIZE`].
    pub fn new(config: SourceConfig) -> Result<Self> {
        let reject = |msg: &str| {
            tracing::error!("wav source: {msg}");
            Err(ProfilerError::InvalidConfig(msg.to_string()))
        };

        if config.num_channels == 0 {
            return reject("# of channels is zero");
        }
        if config.frame_length <= 0 {
            return reject("frame length is zero");
        }
        let frame_size = match config.frame_size() {
            Some(0) => return reject("frame size is zero"),
            Some(size) if size <= MAX_FRAME_SIZE => size,
            _ => return reject("frame size is too large, can't allocate sample buffer"),
        };

        Ok(WavSource {
            config,
            frame_size,
            path: None,
            reader: None,
            paused: false,
            eof: false,
        })
    }

    /// Open `path`; may be called once per source
    ///
    /// # Errors
    ///
    /// Fails if the source was already opened, the file can't be read as WAV,
    /// or its channel count / sample rate differ from the configuration.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tracing::info!(input = %path.display(), "wav source: opening");

        if self.path.is_some() {
            return Err(ProfilerError::Source("can't call open() more than once".into()));
        }
        self.path = Some(path.to_path_buf());

        self.open_file()
    }

    /// Stop producing frames until [`resume`](Self::resume)
    pub fn pause(&mut self) {
        if !self.paused {
            tracing::debug!("wav source: pausing");
        }
        self.paused = true;
    }

    /// Continue after [`pause`](Self::pause), reopening the file if needed
    pub fn resume(&mut self) -> Result<()> {
        if !self.paused {
            return Ok(());
        }

        tracing::debug!("wav source: resuming");
        if self.reader.is_none() {
            self.open_file().inspect_err(|err| {
                tracing::error!(%err, "wav source: open failed when resuming");
            })?;
        }

        self.paused = false;
        Ok(())
    }

    /// Rewind to the first frame, clearing pause and end-of-file
    pub fn restart(&mut self) -> Result<()> {
        tracing::debug!("wav source: restarting");

        let rewound = match self.reader.as_mut() {
            Some(reader) if !self.eof => {
                reader.seek(0).map_err(|err| {
                    tracing::error!(%err, "wav source: seek failed when restarting");
                    ProfilerError::Io(err)
                })?;
                true
            }
            _ => false,
        };

        if !rewound {
            self.close();
            self.open_file().inspect_err(|err| {
                tracing::error!(%err, "wav source: open failed when restarting");
            })?;
        }

        self.paused = false;
        self.eof = false;
        Ok(())
    }

    /// Release the file; [`resume`](Self::resume) or [`restart`](Self::restart) reopen it
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::info!("wav source: closing input");
        }
    }

    /// Configured sample rate (equal to the file's once opened)
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Configured channel count (equal to the file's once opened)
    pub fn num_channels(&self) -> usize {
        self.config.num_channels
    }

    /// Sample-units per frame
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Whether the source is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the end of the file was reached
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Whether a file is currently open
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn open_file(&mut self) -> Result<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| ProfilerError::Source("no input was opened".into()))?;

        let reader = WavReader::open(path).map_err(|err| {
            tracing::error!(input = %path.display(), %err, "wav source: can't open");
            ProfilerError::from(err)
        })?;

        let spec = reader.spec();
        if spec.channels as usize != self.config.num_channels {
            tracing::error!(
                expected = self.config.num_channels,
                actual = spec.channels,
                "wav source: unsupported # of channels"
            );
            return Err(ProfilerError::Source(format!(
                "unsupported # of channels: expected={} actual={}",
                self.config.num_channels, spec.channels
            )));
        }
        if spec.sample_rate != self.config.sample_rate {
            tracing::error!(
                expected = self.config.sample_rate,
                actual = spec.sample_rate,
                "wav source: unsupported sample rate"
            );
            return Err(ProfilerError::Source(format!(
                "unsupported sample rate: expected={} actual={}",
                self.config.sample_rate, spec.sample_rate
            )));
        }

        self.reader = Some(reader);
        Ok(())
    }
}

impl FrameReader for WavSource {
    fn read(&mut self, frame: &mut Frame<'_>) -> Result<bool> {
        if self.paused || self.eof {
            return Ok(false);
        }

        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| ProfilerError::Source("read: non-open input file".into()))?;

        let spec = reader.spec();
        let out = frame.samples_mut();
        let n_read = match spec.sample_format {
            SampleFormat::Float => fill(out, reader.samples::<f32>(), |s| s)?,
            SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                fill(out, reader.samples::<i32>(), |s| s as f32 * scale)?
            }
        };

        if n_read < out.len() {
            tracing::debug!("wav source: got eof");
            self.eof = true;
        }
        if n_read == 0 {
            return Ok(false);
        }

        out[n_read..].fill(0.0);
        Ok(true)
    }
}

/// Copy converted samples into `out`, returning how many were written
fn fill<S, I>(out: &mut [Sample], samples: I, convert: impl Fn(S) -> Sample) -> Result<usize>
where
    I: Iterator<Item = hound::Result<S>>,
{
    let mut n = 0;
    // `out` first so no sample is pulled once the frame is full
    for (slot, sample) in out.iter_mut().zip(samples) {
        *slot = convert(sample?);
        n += 1;
    }
    Ok(n)
}
