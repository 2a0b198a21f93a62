//! End-to-end runs of the profiled WAV pipeline

#![cfg(feature = "wav")]

use audio_profiler::diagnostics::SpeedRecord;
use audio_profiler::pipeline::{run_pipeline, PipelineConfig};
use audio_profiler::ProfilerError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One second of a 16-bit stereo ramp at 8 kHz
fn write_input(dir: &Path) -> PathBuf {
    let path = dir.join("input.wav");
    let spec = WavSpec {
        channels: 2,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for i in 0..8000i32 {
        let value = ((i % 200) - 100) as i16 * 256;
        writer.write_sample(value).unwrap();
        writer.write_sample(-value).unwrap();
    }
    writer.finalize().unwrap();
    path
}

fn config() -> PipelineConfig {
    PipelineConfig {
        stage_name: "test".into(),
        frame_length_ms: 10,
        window_ms: 100,
        report_interval_ms: 0,
        max_queued_frames: 4,
    }
}

#[test]
fn test_pipeline_copies_audio_and_reports_speed() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let output = dir.path().join("output.wav");

    let mut records: Vec<SpeedRecord> = Vec::new();
    let summary = run_pipeline(&input, Some(output.as_path()), &config(), |record| {
        records.push(record.clone());
        Ok(())
    })
    .unwrap();

    // 160 interleaved samples per 10 ms frame
    assert_eq!(summary.frames, 100);
    assert_eq!(summary.samples, 16_000);
    assert!(summary.average_speed.is_finite() && summary.average_speed > 0.0);

    // Zero report period: one report per frame plus the final one
    assert_eq!(records.len(), 101);
    assert!(records.iter().all(|r| r.stage == "test"));
    let last = records.last().unwrap();
    assert_eq!(last.completed_buckets, 10);
    assert_eq!(last.average_speed, summary.average_speed);

    let mut reader = WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().sample_rate, 8000);
    let copied: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert_eq!(copied.len(), 16_000);
    assert_eq!(copied[0], -100.0 * 256.0 / 32768.0);
    assert_eq!(copied[1], 100.0 * 256.0 / 32768.0);
}

#[test]
fn test_pipeline_without_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let summary = run_pipeline(&input, None, &config(), |_| Ok(())).unwrap();
    assert_eq!(summary.frames, 100);
}

#[test]
fn test_pipeline_missing_input() {
    let dir = TempDir::new().unwrap();
    let result = run_pipeline(&dir.path().join("absent.wav"), None, &config(), |_| Ok(()));
    assert!(result.is_err());
}

#[test]
fn test_report_callback_error_stops_pipeline() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let result = run_pipeline(&input, None, &config(), |_| Err("report sink closed".into()));
    assert!(result.is_err());
}

#[test]
fn test_oversized_frame_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let config = PipelineConfig {
        frame_length_ms: 100_000_000_000,
        ..config()
    };

    let result = run_pipeline(&input, None, &config, |_| Ok(()));
    assert!(matches!(result, Err(ProfilerError::InvalidConfig(_))));
}
