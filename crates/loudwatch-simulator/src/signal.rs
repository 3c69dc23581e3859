//! Sample sources for the simulator
//!
//! Both sources advance a shared [`SecondsCounter`] once every `rate`
//! samples, standing in for the hardware timer.

use std::f64::consts::TAU;
use std::io::BufRead;

use loudwatch_core::Sample;
use loudwatch_core::config::{ADC_AVERAGE, ADC_MAX};
use loudwatch_core::io::{SampleSource, SecondsCounter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::args::SignalArgs;

/// Why a simulated source stopped producing samples.
#[derive(Debug)]
pub enum SourceEnd {
    /// Input ran out; the normal end of a simulation.
    Exhausted,
    Failed(anyhow::Error),
}

/// Counts samples and ticks the virtual seconds clock.
struct VirtualTimer<'a> {
    clock: &'a SecondsCounter,
    rate: u32,
    samples: u64,
}

impl<'a> VirtualTimer<'a> {
    fn new(clock: &'a SecondsCounter, rate: u32) -> Self {
        Self {
            clock,
            rate: rate.max(1),
            samples: 0,
        }
    }

    fn advance(&mut self) {
        self.samples += 1;
        if self.samples % u64::from(self.rate) == 0 {
            self.clock.tick();
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.samples as f64 / f64::from(self.rate)
    }
}

fn clamp_to_adc(value: f64) -> Sample {
    value.round().clamp(0.0, f64::from(ADC_MAX)) as Sample
}

// ---------------------------------------------------------------------------
// Synthetic signal
// ---------------------------------------------------------------------------

/// Quiet background noise around the seed level with periodic tone bursts.
pub struct SynthSource<'a> {
    rng: StdRng,
    timer: VirtualTimer<'a>,
    total: u64,
    noise: i32,
    burst_every: f64,
    burst_secs: f64,
    burst_amplitude: f64,
    burst_hz: f64,
}

impl<'a> SynthSource<'a> {
    pub fn new(args: &SignalArgs, clock: &'a SecondsCounter) -> Self {
        Self {
            rng: StdRng::seed_from_u64(args.seed),
            timer: VirtualTimer::new(clock, args.rate),
            total: u64::from(args.seconds) * u64::from(args.rate),
            noise: i32::from(args.noise),
            burst_every: f64::from(args.burst_every.max(1)),
            burst_secs: f64::from(args.burst_ms) / 1000.0,
            burst_amplitude: f64::from(args.burst_amplitude),
            burst_hz: args.burst_hz,
        }
    }

    fn value_at(&mut self, t: f64) -> Sample {
        let noise = if self.noise > 0 {
            self.rng.gen_range(-self.noise..=self.noise)
        } else {
            0
        };
        let mut value = f64::from(ADC_AVERAGE) + f64::from(noise);

        // Bursts start half a period in so the first one lands after startup
        let phase = (t + self.burst_every / 2.0) % self.burst_every;
        if phase < self.burst_secs {
            value += self.burst_amplitude * (TAU * self.burst_hz * t).sin();
        }

        clamp_to_adc(value)
    }
}

impl SampleSource for SynthSource<'_> {
    type Error = SourceEnd;

    async fn next_sample(&mut self) -> Result<Sample, SourceEnd> {
        if self.timer.samples >= self.total {
            return Err(SourceEnd::Exhausted);
        }

        let sample = self.value_at(self.timer.elapsed_secs());
        self.timer.advance();
        Ok(sample)
    }
}

// ---------------------------------------------------------------------------
// Recorded samples
// ---------------------------------------------------------------------------

/// Reads one sample per line; blank lines and `#` comments are skipped.
pub struct ReplaySource<'a, R> {
    reader: R,
    line: String,
    line_number: usize,
    timer: VirtualTimer<'a>,
}

impl<'a, R: BufRead> ReplaySource<'a, R> {
    pub fn new(reader: R, rate: u32, clock: &'a SecondsCounter) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
            timer: VirtualTimer::new(clock, rate),
        }
    }

    fn read_sample(&mut self) -> Result<Sample, SourceEnd> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| SourceEnd::Failed(e.into()))?;
            if read == 0 {
                return Err(SourceEnd::Exhausted);
            }
            self.line_number += 1;

            let text = self.line.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }

            let value: u32 = text.parse().map_err(|e| {
                SourceEnd::Failed(anyhow::anyhow!(
                    "line {}: invalid sample {:?}: {}",
                    self.line_number,
                    text,
                    e
                ))
            })?;
            if value > u32::from(ADC_MAX) {
                log::warn!(
                    "line {}: sample {} above ADC range, clamped to {}",
                    self.line_number,
                    value,
                    ADC_MAX
                );
            }
            return Ok(value.min(u32::from(ADC_MAX)) as Sample);
        }
    }
}

impl<R: BufRead> SampleSource for ReplaySource<'_, R> {
    type Error = SourceEnd;

    async fn next_sample(&mut self) -> Result<Sample, SourceEnd> {
        let sample = self.read_sample()?;
        self.timer.advance();
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use loudwatch_core::io::SecondsClock;

    #[test]
    fn test_replay_skips_comments_and_ticks_clock() {
        let clock = SecondsCounter::new();
        let input = "# recorded at 2 Hz\n1749\n\n1800\n5000\n";
        let mut source = ReplaySource::new(input.as_bytes(), 2, &clock);

        assert_eq!(block_on(source.next_sample()).unwrap(), 1749);
        assert_eq!(clock.now_secs(), 0);
        assert_eq!(block_on(source.next_sample()).unwrap(), 1800);
        assert_eq!(clock.now_secs(), 1);
        assert_eq!(block_on(source.next_sample()).unwrap(), ADC_MAX);
        assert!(matches!(
            block_on(source.next_sample()),
            Err(SourceEnd::Exhausted)
        ));
    }

    #[test]
    fn test_replay_reports_bad_lines() {
        let clock = SecondsCounter::new();
        let mut source = ReplaySource::new("12\nloud\n".as_bytes(), 8000, &clock);

        assert!(block_on(source.next_sample()).is_ok());
        assert!(matches!(
            block_on(source.next_sample()),
            Err(SourceEnd::Failed(_))
        ));
    }

    #[test]
    fn test_synth_length_and_range() {
        let clock = SecondsCounter::new();
        let args = SignalArgs {
            seconds: 2,
            rate: 1000,
            seed: 1,
            noise: 5,
            burst_every: 1,
            burst_ms: 100,
            burst_amplitude: 3000,
            burst_hz: 50.0,
        };
        let mut source = SynthSource::new(&args, &clock);

        let mut count = 0;
        while let Ok(sample) = block_on(source.next_sample()) {
            assert!(sample <= ADC_MAX);
            count += 1;
        }

        assert_eq!(count, 2000);
        assert_eq!(clock.now_secs(), 2);
    }
}
