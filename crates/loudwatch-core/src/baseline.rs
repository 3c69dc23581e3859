//! Running baseline calibration
//!
//! The baseline is a count-weighted running mean of the raw samples, folded in
//! only on every `update_interval`-th cycle to keep divisions off the hot path.

use crate::Sample;
use crate::config::DeviationReference;
use crate::history::CycleIndex;

/// Slowly updating running average of raw samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineTracker {
    seed: f32,
    average: f32,
    update_interval: u32,
    reference: DeviationReference,
}

impl BaselineTracker {
    pub fn new(seed: Sample, update_interval: u32, reference: DeviationReference) -> Self {
        Self {
            seed: f32::from(seed),
            average: f32::from(seed),
            update_interval,
            reference,
        }
    }

    /// Current running average.
    pub fn average(&self) -> f32 {
        self.average
    }

    /// Fold `sample` into the running average if `cycle` is an update cycle.
    ///
    /// The cycle index doubles as the sample count, so the first update of a
    /// lap (cycle 0) replaces the average with the newest sample.
    pub fn update(&mut self, sample: Sample, cycle: CycleIndex) {
        if cycle.value() % self.update_interval != 0 {
            return;
        }

        let count = cycle.value() as f32;
        self.average = (self.average * count + f32::from(sample)) / (count + 1.0);
    }

    /// Magnitude of the difference between `sample` and the deviation reference.
    pub fn deviation(&self, sample: Sample) -> f32 {
        let reference = match self.reference {
            DeviationReference::Seed => self.seed,
            DeviationReference::Running => self.average,
        };
        let sample = f32::from(sample);

        if sample > reference {
            sample - reference
        } else {
            reference - sample
        }
    }
}
