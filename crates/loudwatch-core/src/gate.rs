//! Event gate: threshold comparison, scale priority, and rate limiting
//!
//! Scales are checked finest first. The first scale that closed a block this
//! cycle, exceeds its threshold, and is not blocked by the rate limit emits the
//! event; every other scale is skipped for the cycle. The rate limit is shared
//! across scales: once an event fires, no further event can fire until the
//! seconds clock reads a different value.

use log::debug;

use crate::config::{StartupGate, WINDOW_COUNT, WindowConfig};
use crate::event::DetectionEvent;

/// What one window reported for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowReading {
    pub scale: u32,
    /// True when the window closed a block on this cycle.
    pub fired: bool,
    /// Most recent block sum.
    pub block_sum: u32,
}

/// Rate-limit state at a given second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// An event may fire.
    Idle,
    /// An event already fired during this second.
    SuppressedThisSecond,
}

/// Decides whether a cycle produces a detection event.
pub struct EventGate {
    thresholds: [u32; WINDOW_COUNT],
    last_event_secs: Option<u32>,
}

impl EventGate {
    pub fn new(windows: &[WindowConfig; WINDOW_COUNT], startup: StartupGate) -> Self {
        let last_event_secs = match startup {
            StartupGate::HoldFirstSecond => Some(0),
            StartupGate::Open => None,
        };

        Self {
            thresholds: core::array::from_fn(|i| windows[i].threshold),
            last_event_secs,
        }
    }

    /// Seconds value of the most recent emission, if any.
    pub fn last_event_secs(&self) -> Option<u32> {
        self.last_event_secs
    }

    pub fn state(&self, now_secs: u32) -> GateState {
        if self.last_event_secs == Some(now_secs) {
            GateState::SuppressedThisSecond
        } else {
            GateState::Idle
        }
    }

    /// Evaluate this cycle's readings, in priority order, at `now_secs`.
    pub fn evaluate(
        &mut self,
        now_secs: u32,
        readings: &[WindowReading; WINDOW_COUNT],
    ) -> Option<DetectionEvent> {
        let mut emitted: Option<DetectionEvent> = None;

        for (reading, &threshold) in readings.iter().zip(self.thresholds.iter()) {
            if !reading.fired || reading.block_sum <= threshold {
                continue;
            }

            if let Some(event) = emitted {
                debug!(
                    "window {} over threshold ({}) skipped, window {} already reported",
                    reading.scale, reading.block_sum, event.scale
                );
                continue;
            }

            if self.state(now_secs) == GateState::SuppressedThisSecond {
                debug!(
                    "window {} over threshold ({}) rate limited at {} sec",
                    reading.scale, reading.block_sum, now_secs
                );
                continue;
            }

            self.last_event_secs = Some(now_secs);
            emitted = Some(DetectionEvent {
                seconds: now_secs,
                scale: reading.scale,
                block_sum: reading.block_sum,
            });
        }

        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorConfig;

    fn readings(fired: [bool; WINDOW_COUNT], sums: [u32; WINDOW_COUNT]) -> [WindowReading; WINDOW_COUNT] {
        let scales = [32, 128, 512, 2048];
        core::array::from_fn(|i| WindowReading {
            scale: scales[i],
            fired: fired[i],
            block_sum: sums[i],
        })
    }

    fn gate(startup: StartupGate) -> EventGate {
        EventGate::new(&DetectorConfig::reference().windows, startup)
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let mut gate = gate(StartupGate::HoldFirstSecond);
        let at_threshold = readings([true, false, false, false], [940, 0, 0, 0]);
        let over = readings([true, false, false, false], [941, 0, 0, 0]);

        assert_eq!(gate.evaluate(1, &at_threshold), None);
        assert!(gate.evaluate(1, &over).is_some());
    }

    #[test]
    fn test_only_fired_windows_are_considered() {
        let mut gate = gate(StartupGate::HoldFirstSecond);
        // Stale value above threshold on a window that did not close a block
        let stale = readings([false, false, false, false], [5000, 0, 0, 0]);
        assert_eq!(gate.evaluate(3, &stale), None);
    }

    #[test]
    fn test_finest_scale_wins() {
        let mut gate = gate(StartupGate::HoldFirstSecond);
        let both = readings([true, true, true, true], [960, 0, 0, 50_000]);

        let event = gate.evaluate(2, &both).unwrap();
        assert_eq!(event.scale, 32);
        assert_eq!(event.block_sum, 960);
    }

    #[test]
    fn test_coarser_scale_reports_when_finer_is_quiet() {
        let mut gate = gate(StartupGate::HoldFirstSecond);
        let coarse = readings([true, true, true, true], [100, 200, 300, 50_000]);

        assert_eq!(gate.evaluate(2, &coarse).unwrap().scale, 2048);
    }

    #[test]
    fn test_rate_limit_within_one_second() {
        let mut gate = gate(StartupGate::HoldFirstSecond);
        let loud = readings([true, false, false, false], [1000, 0, 0, 0]);

        assert!(gate.evaluate(5, &loud).is_some());
        assert_eq!(gate.state(5), GateState::SuppressedThisSecond);
        assert_eq!(gate.evaluate(5, &loud), None);

        assert_eq!(gate.state(6), GateState::Idle);
        assert!(gate.evaluate(6, &loud).is_some());
        assert_eq!(gate.last_event_secs(), Some(6));
    }

    #[test]
    fn test_rate_limit_is_shared_across_scales() {
        let mut gate = gate(StartupGate::HoldFirstSecond);
        let fine = readings([true, false, false, false], [1000, 0, 0, 0]);
        let coarse = readings([false, false, false, true], [0, 0, 0, 50_000]);

        assert!(gate.evaluate(5, &fine).is_some());
        assert_eq!(gate.evaluate(5, &coarse), None);
    }

    #[test]
    fn test_startup_policies() {
        let loud = readings([true, false, false, false], [1000, 0, 0, 0]);

        let mut held = gate(StartupGate::HoldFirstSecond);
        assert_eq!(held.state(0), GateState::SuppressedThisSecond);
        assert_eq!(held.evaluate(0, &loud), None);
        assert!(held.evaluate(1, &loud).is_some());

        let mut open = gate(StartupGate::Open);
        assert_eq!(open.last_event_secs(), None);
        assert!(open.evaluate(0, &loud).is_some());
        assert_eq!(open.evaluate(0, &loud), None);
    }
}
