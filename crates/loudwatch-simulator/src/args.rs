use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::{Args, Parser, Subcommand};
use loudwatch_core::config::WINDOW_COUNT;
use loudwatch_core::{DetectorConfig, DeviationReference, StartupGate};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run the loudwatch detector on the desktop.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a noisy signal with periodic loud bursts and detect on it.
    Synth {
        #[command(flatten)]
        signal: SignalArgs,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Detect on recorded samples, one unsigned integer per line.
    Replay {
        /// Sample file, or `-` for stdin.
        path: PathBuf,
        /// Samples per second of the recording.
        #[arg(long, default_value_t = 8000)]
        rate: u32,
        #[command(flatten)]
        detector: DetectorArgs,
    },
    /// Read detection lines from stdin and summarize them.
    Decode,
}

#[derive(Args)]
pub struct SignalArgs {
    /// Length of the generated signal in seconds.
    #[arg(long, default_value_t = 10)]
    pub seconds: u32,
    /// Samples per second.
    #[arg(long, default_value_t = 8000)]
    pub rate: u32,
    /// Seed for the noise generator.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
    /// Peak amplitude of the background noise, in ADC counts.
    #[arg(long, default_value_t = 12)]
    pub noise: u16,
    /// Seconds between the starts of two bursts.
    #[arg(long, default_value_t = 3)]
    pub burst_every: u32,
    /// Burst length in milliseconds.
    #[arg(long, default_value_t = 150)]
    pub burst_ms: u32,
    /// Peak amplitude of the bursts, in ADC counts.
    #[arg(long, default_value_t = 400)]
    pub burst_amplitude: u16,
    /// Burst tone frequency in Hz.
    #[arg(long, default_value_t = 440.0)]
    pub burst_hz: f64,
}

#[derive(Args)]
pub struct DetectorArgs {
    /// Thresholds for the 32/128/512/2048 windows, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub thresholds: Option<Vec<u32>>,
    /// Allow an event before the seconds clock first ticks.
    #[arg(long)]
    pub open_startup: bool,
    /// Measure deviations from the running baseline instead of the seed.
    #[arg(long)]
    pub running_baseline: bool,
}

impl DetectorArgs {
    pub fn to_config(&self) -> Result<DetectorConfig> {
        let mut config = DetectorConfig::reference();

        if let Some(thresholds) = &self.thresholds {
            ensure!(
                thresholds.len() == WINDOW_COUNT,
                "expected {} thresholds, got {}",
                WINDOW_COUNT,
                thresholds.len()
            );
            let mut values = [0; WINDOW_COUNT];
            values.copy_from_slice(thresholds);
            config = config.with_thresholds(values);
        }
        if self.open_startup {
            config = config.with_startup_gate(StartupGate::Open);
        }
        if self.running_baseline {
            config = config.with_deviation_reference(DeviationReference::Running);
        }

        Ok(config)
    }
}
