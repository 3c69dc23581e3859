//! Desktop simulator for the loudwatch acoustic energy detector.
//!
//! Drives `loudwatch-core` from synthetic or recorded samples with a virtual
//! seconds clock, writing detection lines to stdout exactly as the firmware
//! writes them to its UART. The `decode` subcommand reads such lines back
//! (for example from a serial or Bluetooth capture) and summarizes them.
//!
//! ```text
//! loudwatch-simulator synth --seconds 30 --burst-amplitude 250
//! loudwatch-simulator replay capture.txt --rate 8000
//! loudwatch-simulator synth | loudwatch-simulator decode
//! ```
//!
//! Set `RUST_LOG=debug` to see suppressed detections and index wraps.

mod args;
mod signal;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use embassy_futures::block_on;
use log::{info, warn};

use loudwatch_core::driver::run;
use loudwatch_core::io::{Indicator, SampleSource, SecondsClock, SecondsCounter};
use loudwatch_core::{DetectionEvent, DetectorConfig, ReferenceDetector, Reporter};

use args::{Cli, Commands};
use signal::{ReplaySource, SourceEnd, SynthSource};

// ---------------------------------------------------------------------------
// Host collaborators
// ---------------------------------------------------------------------------

/// Output channel backed by a blocking std writer, normally stdout.
struct StdSink<W> {
    writer: W,
}

impl<W: io::Write> StdSink<W> {
    fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W> embedded_io::ErrorType for StdSink<W> {
    type Error = io::Error;
}

impl<W: io::Write> embedded_io_async::Write for StdSink<W> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
        self.writer.write(buf)
    }

    async fn flush(&mut self) -> Result<(), io::Error> {
        self.writer.flush()
    }
}

/// Stands in for the LED: counts detection cycles and logs each rising edge.
#[derive(Default)]
struct LogIndicator {
    active: bool,
    detections: u32,
}

impl Indicator for LogIndicator {
    fn set_active(&mut self, active: bool) {
        if active {
            // Lit on exactly the cycles that emit an event
            self.detections += 1;
            if !self.active {
                log::debug!("Indicator on (detection {})", self.detections);
            }
        }
        self.active = active;
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

/// Run `source` through a fresh detector until it stops.
fn detect<S>(config: DetectorConfig, source: &mut S, clock: &SecondsCounter) -> Result<()>
where
    S: SampleSource<Error = SourceEnd>,
{
    let mut detector =
        ReferenceDetector::new(config).context("Invalid detector configuration")?;
    let mut indicator = LogIndicator::default();
    let mut reporter = Reporter::new(StdSink::new(io::stdout()));

    info!("Detector configuration: {:?}", config);

    let result = block_on(run(
        &mut detector,
        source,
        clock,
        &mut indicator,
        &mut reporter,
    ));

    let outcome = match result {
        Err(SourceEnd::Exhausted) => Ok(()),
        Err(SourceEnd::Failed(e)) => Err(e.context("Sample source failed")),
        Ok(never) => match never {},
    };

    info!(
        "Processed input up to {} sec, {} detection(s), final baseline {:.1}",
        clock.now_secs(),
        indicator.detections,
        detector.baseline().average()
    );

    outcome
}

/// Echo each event line from `input` with its mean deviation, then a per-scale summary.
fn decode(input: impl BufRead, mut out: impl io::Write) -> Result<()> {
    let mut per_scale: BTreeMap<u32, (u32, f32)> = BTreeMap::new();

    for (number, line) in input.lines().enumerate() {
        let line = line.context("Failed to read event line")?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<DetectionEvent>() {
            Ok(event) => {
                let mean = event.mean_deviation();
                writeln!(out, "{event}  (mean deviation {mean:.1} per sample)")?;

                let entry = per_scale.entry(event.scale).or_default();
                entry.0 += 1;
                entry.1 = entry.1.max(mean);
            }
            Err(e) => warn!("line {}: skipped {:?}: {}", number + 1, line, e),
        }
    }

    writeln!(out, "---")?;
    for (scale, (count, peak)) in &per_scale {
        writeln!(
            out,
            "window {scale}: {count} event(s), peak mean deviation {peak:.1}"
        )?;
    }

    Ok(())
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let clock = SecondsCounter::new();

    match cli.command {
        Commands::Synth { signal, detector } => {
            let config = detector.to_config()?;
            info!(
                "Synthesizing {} sec at {} Hz (burst every {} sec, amplitude {})",
                signal.seconds, signal.rate, signal.burst_every, signal.burst_amplitude
            );
            let mut source = SynthSource::new(&signal, &clock);
            detect(config, &mut source, &clock)
        }
        Commands::Replay {
            path,
            rate,
            detector,
        } => {
            let config = detector.to_config()?;
            if path.as_os_str() == "-" {
                let mut source = ReplaySource::new(io::stdin().lock(), rate, &clock);
                detect(config, &mut source, &clock)
            } else {
                let file = File::open(&path)
                    .with_context(|| format!("Failed to open sample file: {}", path.display()))?;
                let mut source = ReplaySource::new(BufReader::new(file), rate, &clock);
                detect(config, &mut source, &clock)
            }
        }
        Commands::Decode => decode(io::stdin().lock(), io::stdout().lock()),
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    if let Err(e) = run_cli() {
        log::error!("Error: {:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loudwatch_core::ReportError;

    /// Std writer that always fails with `kind`.
    struct FailingWriter {
        kind: io::ErrorKind,
    }

    impl io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(self.kind.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_decode_summarizes_per_scale() {
        let input = "1 sec, window 32: 960\n\ngarbage\n2 sec, window 32: 1280\n3 sec, window 2048: 45056\n";
        let mut out = Vec::new();

        decode(input.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "1 sec, window 32: 960  (mean deviation 30.0 per sample)",
                "2 sec, window 32: 1280  (mean deviation 40.0 per sample)",
                "3 sec, window 2048: 45056  (mean deviation 22.0 per sample)",
                "---",
                "window 32: 2 event(s), peak mean deviation 40.0",
                "window 2048: 1 event(s), peak mean deviation 22.0",
            ]
        );
    }

    #[test]
    fn test_decode_empty_input_prints_only_separator() {
        let mut out = Vec::new();
        decode("\n\n".as_bytes(), &mut out).unwrap();
        assert_eq!(out, b"---\n");
    }

    #[test]
    fn test_sink_keeps_io_error_kind() {
        let mut reporter = Reporter::new(StdSink::new(FailingWriter {
            kind: io::ErrorKind::PermissionDenied,
        }));
        let event = DetectionEvent {
            seconds: 1,
            scale: 32,
            block_sum: 1000,
        };

        assert_eq!(
            block_on(reporter.report(&event)),
            Err(ReportError::Write(
                embedded_io::ErrorKind::PermissionDenied
            ))
        );
    }

    #[test]
    fn test_indicator_counts_every_detection_cycle() {
        let mut indicator = LogIndicator::default();
        // Two back-to-back detections form a single lit stretch
        for active in [false, true, true, false, true] {
            indicator.set_active(active);
        }
        assert_eq!(indicator.detections, 3);
    }
}
