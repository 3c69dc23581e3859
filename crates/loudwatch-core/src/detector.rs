//! The detection cycle
//!
//! [`Detector`] owns every piece of mutable detection state: the baseline,
//! the history ring, the window aggregators, and the event gate. One call to
//! [`Detector::step`] runs one full cycle for one sample.

use log::{debug, info};

use crate::Sample;
use crate::baseline::BaselineTracker;
use crate::config::{ConfigError, DetectorConfig, HISTORY_LEN, WINDOW_COUNT};
use crate::event::DetectionEvent;
use crate::gate::{EventGate, GateState, WindowReading};
use crate::history::{CycleIndex, HistoryRing};
use crate::window::WindowAggregator;

/// Detector sized for the reference hardware.
pub type ReferenceDetector = Detector<HISTORY_LEN>;

/// Result of one detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Index of the cycle that was processed.
    pub cycle: CycleIndex,
    /// Event to report, if the gate emitted one.
    pub event: Option<DetectionEvent>,
}

impl CycleOutcome {
    /// The indicator is lit exactly on cycles that emit an event.
    pub fn indicator_active(&self) -> bool {
        self.event.is_some()
    }
}

/// Multi-scale acoustic energy detector over a history of `N` deviations.
pub struct Detector<const N: usize> {
    cycle_wrap: u32,
    cycle: CycleIndex,
    baseline: BaselineTracker,
    history: HistoryRing<N>,
    windows: [WindowAggregator; WINDOW_COUNT],
    gate: EventGate,
}

impl<const N: usize> Detector<N> {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate(N)?;

        Ok(Self {
            cycle_wrap: config.cycle_wrap,
            cycle: CycleIndex::ZERO,
            baseline: BaselineTracker::new(
                config.baseline_seed,
                config.baseline_update_interval,
                config.deviation_reference,
            ),
            history: HistoryRing::new(),
            windows: core::array::from_fn(|i| WindowAggregator::new(config.windows[i].scale, N)),
            gate: EventGate::new(&config.windows, config.startup_gate),
        })
    }

    /// Index the next call to [`Detector::step`] will process.
    pub fn cycle(&self) -> CycleIndex {
        self.cycle
    }

    pub fn baseline(&self) -> &BaselineTracker {
        &self.baseline
    }

    pub fn gate_state(&self, now_secs: u32) -> GateState {
        self.gate.state(now_secs)
    }

    /// Block sums currently visible to the gate, finest scale first.
    pub fn block_sums(&self) -> [u32; WINDOW_COUNT] {
        core::array::from_fn(|i| self.windows[i].current(self.cycle))
    }

    /// Run one full cycle for `sample`, with the seconds clock at `now_secs`.
    pub fn step(&mut self, sample: Sample, now_secs: u32) -> CycleOutcome {
        let cycle = self.cycle;

        self.baseline.update(sample, cycle);
        let deviation = self.baseline.deviation(sample);

        // Blocks closing on this cycle cover the cycles before it, so they are
        // summed before this cycle's deviation takes the oldest slot.
        let history = &self.history;
        let readings: [WindowReading; WINDOW_COUNT] = core::array::from_fn(|i| {
            let window = &mut self.windows[i];
            let fired = window.maybe_recompute(cycle, history).is_some();
            WindowReading {
                scale: window.scale(),
                fired,
                block_sum: window.current(cycle),
            }
        });

        // Fractional part is dropped, as in the fixed-point front end
        self.history.push(deviation as u16, cycle);

        let event = self.gate.evaluate(now_secs, &readings);
        if let Some(event) = &event {
            info!("Detection at cycle {}: {}", cycle, event);
        }

        self.cycle = cycle.next(self.cycle_wrap);
        if self.cycle == CycleIndex::ZERO {
            debug!("Cycle index wrapped after {} cycles", self.cycle_wrap);
        }

        CycleOutcome { cycle, event }
    }
}
