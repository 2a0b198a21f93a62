#[cfg(not(feature = "wav"))]
fn main() {
    eprintln!("The audio-profiler CLI requires the \"wav\" feature.");
    eprintln!("Rebuild with `--features wav` to enable it.");
}

#[cfg(feature = "wav")]
mod cli {
    use std::fs::File;
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use audio_profiler::diagnostics::CsvSpeedLog;
    use audio_profiler::pipeline::{run_pipeline, PipelineConfig};
    use clap::{Args, Parser, Subcommand};
    use tracing_subscriber::EnvFilter;

    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    pub struct Cli {
        #[command(subcommand)]
        pub command: Commands,
    }

    #[derive(Subcommand)]
    pub enum Commands {
        /// Stream a WAV file through a profiled queue and report its throughput
        Profile(ProfileArgs),
    }

    #[derive(Args, Debug)]
    pub struct ProfileArgs {
        /// WAV file to read
        pub input: PathBuf,

        /// Write the streamed audio here (discarded if omitted)
        #[arg(long)]
        pub output: Option<PathBuf>,

        /// JSON pipeline configuration; flags below override it
        #[arg(long)]
        pub config: Option<PathBuf>,

        /// Averaging window in milliseconds
        #[arg(long)]
        pub window_ms: Option<u64>,

        /// Frame length in milliseconds
        #[arg(long)]
        pub frame_ms: Option<u64>,

        /// Minimum time between speed reports in milliseconds
        #[arg(long)]
        pub report_ms: Option<u64>,

        /// Append every speed report to this CSV file
        #[arg(long)]
        pub csv: Option<PathBuf>,
    }

    impl ProfileArgs {
        pub fn pipeline_config(&self) -> Result<PipelineConfig> {
            let mut config = match &self.config {
                Some(path) => PipelineConfig::from_json_file(path)
                    .with_context(|| format!("can't load config {}", path.display()))?,
                None => PipelineConfig::default(),
            };

            if let Some(window_ms) = self.window_ms {
                config.window_ms = window_ms;
            }
            if let Some(frame_ms) = self.frame_ms {
                config.frame_length_ms = frame_ms;
            }
            if let Some(report_ms) = self.report_ms {
                config.report_interval_ms = report_ms;
            }

            Ok(config)
        }
    }

    pub fn run() -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .try_init()
            .ok();

        let cli = Cli::parse();
        match cli.command {
            Commands::Profile(args) => profile(&args),
        }
    }

    fn profile(args: &ProfileArgs) -> Result<()> {
        let config = args.pipeline_config()?;

        let mut csv = match &args.csv {
            Some(path) => Some(CsvSpeedLog::new(
                File::create(path).with_context(|| format!("can't create {}", path.display()))?,
            )),
            None => None,
        };

        let summary = run_pipeline(&args.input, args.output.as_deref(), &config, |record| {
            if let Some(log) = csv.as_mut() {
                log.append(record)?;
            }
            Ok(())
        })
        .with_context(|| format!("profiling {} failed", args.input.display()))?;

        if let Some(log) = csv.as_mut() {
            log.flush().context("can't flush CSV report")?;
        }

        println!("\n=== Profiling Summary ===");
        println!("Stage:             {}", config.stage_name);
        println!("Frames:            {}", summary.frames);
        println!("Samples:           {}", summary.samples);
        println!("Average speed:     {:.1} samples/s per channel", summary.average_speed);

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn parse(args: &[&str]) -> ProfileArgs {
            match Cli::try_parse_from(args).unwrap().command {
                Commands::Profile(args) => args,
            }
        }

        #[test]
        fn test_flags_override_defaults() {
            let args = parse(&[
                "audio-profiler",
                "profile",
                "in.wav",
                "--window-ms",
                "250",
                "--frame-ms",
                "5",
            ]);
            let config = args.pipeline_config().unwrap();
            assert_eq!(config.window_ms, 250);
            assert_eq!(config.frame_length_ms, 5);
            assert_eq!(config.report_interval_ms, 1000);
            assert!(args.output.is_none());
        }

        #[test]
        fn test_input_is_required() {
            assert!(Cli::try_parse_from(["audio-profiler", "profile"]).is_err());
        }
    }
}

#[cfg(feature = "wav")]
fn main() {
    if let Err(err) = cli::run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
