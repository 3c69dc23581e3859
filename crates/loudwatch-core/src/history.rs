//! Deviation history ring and the cycle index every ring is addressed by

use core::fmt;

/// Position of the current cycle within a detection lap.
///
/// Every ring slot in the detector is a pure function of this value, so ring
/// positions can never drift apart. The index wraps to zero at a modulus that
/// is a multiple of every ring length, which keeps the mapping consistent
/// across the wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct CycleIndex(u32);

impl CycleIndex {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// The following cycle, wrapping to zero at `modulus`.
    pub const fn next(self, modulus: u32) -> Self {
        let next = self.0 + 1;
        if next >= modulus { Self::ZERO } else { Self(next) }
    }

    /// True when this cycle closes a block of `scale` cycles.
    ///
    /// Cycle zero never closes a block: nothing has been recorded yet.
    pub const fn closes_block(self, scale: u32) -> bool {
        self.0 > 0 && self.0 % scale == 0
    }

    /// Ring slot for a ring of `len` entries.
    pub const fn slot(self, len: usize) -> usize {
        self.0 as usize % len
    }
}

impl fmt::Display for CycleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-capacity ring of per-cycle deviation magnitudes.
///
/// Slot `i` holds the deviation recorded at the most recent cycle whose index
/// is congruent to `i` modulo `N`. Nothing is ever removed; each push
/// overwrites the oldest slot.
pub struct HistoryRing<const N: usize> {
    slots: [u16; N],
}

impl<const N: usize> HistoryRing<N> {
    pub const fn new() -> Self {
        Self { slots: [0; N] }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Record the deviation observed at `cycle`.
    pub fn push(&mut self, deviation: u16, cycle: CycleIndex) {
        self.slots[cycle.slot(N)] = deviation;
    }

    /// Sum of the `length` entries at logical positions
    /// `end_exclusive - length .. end_exclusive`.
    ///
    /// Positions are reduced modulo `N`, so a span that straddles the end of
    /// the backing array is summed correctly. Returns 0 when fewer than
    /// `length` positions precede `end_exclusive`.
    pub fn sum_range(&self, end_exclusive: u32, length: u32) -> u32 {
        debug_assert!(length as usize <= N, "range longer than the ring");

        if end_exclusive < length {
            return 0;
        }

        let start = (end_exclusive - length) as usize;
        (start..start + length as usize)
            .map(|position| u32::from(self.slots[position % N]))
            .sum()
    }
}

impl<const N: usize> Default for HistoryRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
