//! Sound File I/O
//!
//! WAV-backed frame source and sink built on `hound`. These are plain format
//! adapters: they move samples and never touch profiler state.

pub mod wav_sink;
pub mod wav_source;

pub use wav_sink::WavSink;
pub use wav_source::{SourceConfig, WavSource, MAX_FRAME_SIZE};
