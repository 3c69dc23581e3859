//! Interfaces to the hardware collaborators
//!
//! The core never touches peripherals directly. Sampling, timekeeping, and
//! the indicator are reached through these traits, and the output channel is
//! any [`embedded_io_async::Write`] (see [`crate::report`]).

use core::convert::Infallible;
use core::fmt::Debug;
use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::Sample;

/// Produces one raw sample per detection cycle.
pub trait SampleSource {
    type Error: Debug;

    /// Wait for the next sample.
    fn next_sample(&mut self) -> impl Future<Output = Result<Sample, Self::Error>>;
}

/// Monotonic seconds counter driven by an external timer.
pub trait SecondsClock {
    /// Current value. Never blocks.
    fn now_secs(&self) -> u32;
}

/// Visual detection indicator, e.g. an LED.
pub trait Indicator {
    fn set_active(&mut self, active: bool);
}

/// Indicator for setups without one.
pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn set_active(&mut self, _active: bool) {}
}

/// Depth of the sample handoff: exactly one sample in flight.
pub const MAILBOX_DEPTH: usize = 1;

/// Single-slot handoff between the acquisition task and the cycle driver.
///
/// ```rust,ignore
/// static SAMPLES: SampleMailbox = SampleMailbox::new();
///
/// // acquisition task
/// SAMPLES.sender().send(adc_value).await;
///
/// // driver task
/// let mut source = MailboxSource::new(SAMPLES.receiver());
/// ```
pub type SampleMailbox = Channel<CriticalSectionRawMutex, Sample, MAILBOX_DEPTH>;

pub type SampleSender<'a> = Sender<'a, CriticalSectionRawMutex, Sample, MAILBOX_DEPTH>;

/// [`SampleSource`] fed from a [`SampleMailbox`].
pub struct MailboxSource<'a> {
    receiver: Receiver<'a, CriticalSectionRawMutex, Sample, MAILBOX_DEPTH>,
}

impl<'a> MailboxSource<'a> {
    pub fn new(receiver: Receiver<'a, CriticalSectionRawMutex, Sample, MAILBOX_DEPTH>) -> Self {
        Self { receiver }
    }
}

impl SampleSource for MailboxSource<'_> {
    type Error = Infallible;

    async fn next_sample(&mut self) -> Result<Sample, Infallible> {
        Ok(self.receiver.receive().await)
    }
}

/// Seconds counter incremented from a timer task or interrupt.
pub struct SecondsCounter {
    secs: AtomicU32,
}

impl SecondsCounter {
    pub const fn new() -> Self {
        Self {
            secs: AtomicU32::new(0),
        }
    }

    /// Advance by one second.
    pub fn tick(&self) {
        self.secs.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for SecondsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SecondsClock for SecondsCounter {
    fn now_secs(&self) -> u32 {
        self.secs.load(Ordering::Relaxed)
    }
}
