//! Hardware-independent core library for loudwatch
//!
//! This crate contains all platform-agnostic logic for the loudwatch acoustic
//! energy detector: baseline calibration, the deviation history ring, the
//! multi-scale window aggregators, the event gate, event reporting, and the
//! async cycle driver that ties them to the sampling hardware.
//!
//! It is `#![no_std]` and allocation-free so it compiles on both embedded
//! targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod baseline;
pub mod config;
pub mod detector;
pub mod driver;
pub mod event;
pub mod gate;
pub mod history;
pub mod io;
pub mod report;
pub mod window;

pub use config::{ConfigError, DetectorConfig, DeviationReference, StartupGate, WindowConfig};
pub use detector::{CycleOutcome, Detector, ReferenceDetector};
pub use event::{DetectionEvent, ParseEventError};
pub use history::CycleIndex;
pub use report::{ReportError, Reporter};

/// A raw amplitude reading from the sampling front end.
pub type Sample = u16;
