//! Build-time detector configuration
//!
//! The reference values were tuned against the noise floor of a 12-bit
//! microphone front end sampled at a fixed cadence. They are plain constants so
//! firmware builds bake them in, while [`DetectorConfig`] lets the simulator and
//! tests swap individual values.

use thiserror_no_std::Error;

use crate::Sample;

/// Number of deviation slots kept in the history ring.
pub const HISTORY_LEN: usize = 2048;

/// Number of simultaneous window scales.
pub const WINDOW_COUNT: usize = 4;

/// Upper bound on blocks a single window may keep (`HISTORY_LEN / smallest scale`).
pub const MAX_WINDOW_BLOCKS: usize = 64;

/// Largest value the 12-bit ADC can produce.
pub const ADC_MAX: Sample = 4095;

/// Quiet-room ADC reading, used to seed the baseline.
pub const ADC_AVERAGE: Sample = 1749;

/// The baseline only absorbs a new sample on every Nth cycle.
pub const BASELINE_UPDATE_INTERVAL: u32 = 32;

/// Cycle index wraps back to zero after four laps of the largest window.
pub const CYCLE_WRAP: u32 = 8 * 1024;

pub const WINDOW_32_THRESHOLD: u32 = 940;
pub const WINDOW_128_THRESHOLD: u32 = 3100;
pub const WINDOW_512_THRESHOLD: u32 = 11550;
pub const WINDOW_2048_THRESHOLD: u32 = 43000;

/// Value that deviations are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviationReference {
    /// Fixed seed value. The reference thresholds were tuned this way.
    #[default]
    Seed,
    /// Running baseline average.
    Running,
}

/// Whether an event may fire before the seconds clock first advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupGate {
    /// Last-event time starts at second 0, which blocks events until the first tick.
    #[default]
    HoldFirstSecond,
    /// No event has been recorded yet, so the first detection fires immediately.
    Open,
}

/// One window scale and its detection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    /// Number of consecutive deviations summed into one block.
    pub scale: u32,
    /// A block sum strictly greater than this is a detection.
    pub threshold: u32,
}

impl WindowConfig {
    pub const fn new(scale: u32, threshold: u32) -> Self {
        Self { scale, threshold }
    }
}

/// Full detector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Initial baseline value.
    pub baseline_seed: Sample,
    /// Baseline update cadence in cycles.
    pub baseline_update_interval: u32,
    pub deviation_reference: DeviationReference,
    /// Windows in priority order, finest first.
    pub windows: [WindowConfig; WINDOW_COUNT],
    /// Cycle index modulus.
    pub cycle_wrap: u32,
    pub startup_gate: StartupGate,
}

impl DetectorConfig {
    /// The tuned values of the reference hardware.
    pub const fn reference() -> Self {
        Self {
            baseline_seed: ADC_AVERAGE,
            baseline_update_interval: BASELINE_UPDATE_INTERVAL,
            deviation_reference: DeviationReference::Seed,
            windows: [
                WindowConfig::new(32, WINDOW_32_THRESHOLD),
                WindowConfig::new(128, WINDOW_128_THRESHOLD),
                WindowConfig::new(512, WINDOW_512_THRESHOLD),
                WindowConfig::new(2048, WINDOW_2048_THRESHOLD),
            ],
            cycle_wrap: CYCLE_WRAP,
            startup_gate: StartupGate::HoldFirstSecond,
        }
    }

    pub const fn with_baseline_seed(mut self, seed: Sample) -> Self {
        self.baseline_seed = seed;
        self
    }

    pub const fn with_deviation_reference(mut self, reference: DeviationReference) -> Self {
        self.deviation_reference = reference;
        self
    }

    pub const fn with_startup_gate(mut self, gate: StartupGate) -> Self {
        self.startup_gate = gate;
        self
    }

    pub const fn with_windows(mut self, windows: [WindowConfig; WINDOW_COUNT]) -> Self {
        self.windows = windows;
        self
    }

    /// Replace the thresholds while keeping the scales.
    pub const fn with_thresholds(mut self, thresholds: [u32; WINDOW_COUNT]) -> Self {
        let mut i = 0;
        while i < WINDOW_COUNT {
            self.windows[i].threshold = thresholds[i];
            i += 1;
        }
        self
    }

    pub const fn with_cycle_wrap(mut self, cycle_wrap: u32) -> Self {
        self.cycle_wrap = cycle_wrap;
        self
    }

    /// Check that every ring index stays derivable from the cycle index
    /// for a history ring of `history_len` slots.
    pub fn validate(&self, history_len: usize) -> Result<(), ConfigError> {
        if self.baseline_update_interval == 0 {
            return Err(ConfigError::ZeroBaselineInterval);
        }

        let mut previous = 0;
        for window in &self.windows {
            let scale = window.scale as usize;
            if scale == 0 {
                return Err(ConfigError::ZeroScale);
            }
            if window.scale <= previous {
                return Err(ConfigError::ScalesNotAscending {
                    scale: window.scale,
                });
            }
            if scale > history_len || history_len % scale != 0 {
                return Err(ConfigError::ScaleNotDivisor {
                    scale: window.scale,
                    history_len,
                });
            }
            if history_len / scale > MAX_WINDOW_BLOCKS {
                return Err(ConfigError::TooManyBlocks {
                    scale: window.scale,
                    max: MAX_WINDOW_BLOCKS,
                });
            }
            previous = window.scale;
        }

        if self.cycle_wrap == 0 || self.cycle_wrap as usize % history_len != 0 {
            return Err(ConfigError::InvalidWrap {
                cycle_wrap: self.cycle_wrap,
                history_len,
            });
        }

        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// Error types for detector configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Window scale must be non-zero")]
    ZeroScale,

    #[error("Window scales must be strictly ascending (offending scale: {scale})")]
    ScalesNotAscending { scale: u32 },

    #[error("Window scale {scale} does not divide history length {history_len}")]
    ScaleNotDivisor { scale: u32, history_len: usize },

    #[error("Window scale {scale} needs more than {max} blocks")]
    TooManyBlocks { scale: u32, max: usize },

    #[error("Cycle wrap {cycle_wrap} is not a positive multiple of history length {history_len}")]
    InvalidWrap { cycle_wrap: u32, history_len: usize },

    #[error("Baseline update interval must be non-zero")]
    ZeroBaselineInterval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_config_is_valid() {
        assert_eq!(DetectorConfig::reference().validate(HISTORY_LEN), Ok(()));
        assert_eq!(DetectorConfig::default(), DetectorConfig::reference());
    }

    #[test]
    fn test_with_thresholds_keeps_scales() {
        let config = DetectorConfig::reference().with_thresholds([1, 2, 3, 4]);
        let scales: [u32; WINDOW_COUNT] = core::array::from_fn(|i| config.windows[i].scale);
        let thresholds: [u32; WINDOW_COUNT] =
            core::array::from_fn(|i| config.windows[i].threshold);

        assert_eq!(scales, [32, 128, 512, 2048]);
        assert_eq!(thresholds, [1, 2, 3, 4]);
    }

    #[test]
    fn test_rejects_scale_that_does_not_divide_history() {
        let config = DetectorConfig::reference().with_windows([
            WindowConfig::new(32, 1),
            WindowConfig::new(96, 1),
            WindowConfig::new(512, 1),
            WindowConfig::new(2048, 1),
        ]);

        assert_eq!(
            config.validate(HISTORY_LEN),
            Err(ConfigError::ScaleNotDivisor {
                scale: 96,
                history_len: HISTORY_LEN
            })
        );
    }

    #[test]
    fn test_rejects_unordered_scales() {
        let config = DetectorConfig::reference().with_windows([
            WindowConfig::new(128, 1),
            WindowConfig::new(32, 1),
            WindowConfig::new(512, 1),
            WindowConfig::new(2048, 1),
        ]);

        assert_eq!(
            config.validate(HISTORY_LEN),
            Err(ConfigError::ScalesNotAscending { scale: 32 })
        );
    }

    #[test]
    fn test_rejects_too_many_blocks() {
        let config = DetectorConfig::reference().with_windows([
            WindowConfig::new(16, 1),
            WindowConfig::new(128, 1),
            WindowConfig::new(512, 1),
            WindowConfig::new(2048, 1),
        ]);

        assert_eq!(
            config.validate(HISTORY_LEN),
            Err(ConfigError::TooManyBlocks {
                scale: 16,
                max: MAX_WINDOW_BLOCKS
            })
        );
    }

    #[test]
    fn test_rejects_wrap_not_multiple_of_history() {
        let config = DetectorConfig::reference().with_cycle_wrap(3000);
        assert!(matches!(
            config.validate(HISTORY_LEN),
            Err(ConfigError::InvalidWrap { cycle_wrap: 3000, .. })
        ));

        let config = DetectorConfig::reference().with_cycle_wrap(0);
        assert!(config.validate(HISTORY_LEN).is_err());
    }
}
