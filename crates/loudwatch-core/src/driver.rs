//! Async cycle driver
//!
//! Each cycle suspends exactly once, waiting for the next sample, and then runs
//! to completion without yielding until the event (if any) has been handed to
//! the output channel.

use core::convert::Infallible;

use embedded_io_async::Write;
use log::warn;

use crate::detector::{CycleOutcome, Detector};
use crate::io::{Indicator, SampleSource, SecondsClock};
use crate::report::Reporter;

/// Run a single detection cycle.
///
/// Sample source errors end the cycle and are returned unchanged. A failed
/// report is logged and dropped: the output channel has no retry.
pub async fn run_cycle<const N: usize, S, C, I, W>(
    detector: &mut Detector<N>,
    source: &mut S,
    clock: &C,
    indicator: &mut I,
    reporter: &mut Reporter<W>,
) -> Result<CycleOutcome, S::Error>
where
    S: SampleSource,
    C: SecondsClock,
    I: Indicator,
    W: Write,
{
    let sample = source.next_sample().await?;
    let outcome = detector.step(sample, clock.now_secs());

    indicator.set_active(outcome.indicator_active());

    if let Some(event) = &outcome.event {
        if let Err(e) = reporter.report(event).await {
            warn!("Dropped detection report ({}): {}", event, e);
        }
    }

    Ok(outcome)
}

/// Run detection cycles until the sample source fails.
pub async fn run<const N: usize, S, C, I, W>(
    detector: &mut Detector<N>,
    source: &mut S,
    clock: &C,
    indicator: &mut I,
    reporter: &mut Reporter<W>,
) -> Result<Infallible, S::Error>
where
    S: SampleSource,
    C: SecondsClock,
    I: Indicator,
    W: Write,
{
    loop {
        run_cycle(detector, source, clock, indicator, reporter).await?;
    }
}
