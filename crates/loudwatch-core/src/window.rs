//! Multi-scale window aggregation
//!
//! Each aggregator owns a ring of block sums for one scale. A block sum is the
//! total deviation over `scale` consecutive cycles and is computed once, on the
//! cycle that closes the block.

use heapless::Vec;
use log::trace;

use crate::config::MAX_WINDOW_BLOCKS;
use crate::history::{CycleIndex, HistoryRing};

/// Ring of block sums for a single window scale.
pub struct WindowAggregator {
    scale: u32,
    /// Length of the history ring this aggregator reads from.
    history_len: usize,
    blocks: Vec<u32, MAX_WINDOW_BLOCKS>,
}

impl WindowAggregator {
    /// Create an aggregator for `scale` over a history ring of `history_len` slots.
    ///
    /// The configuration must already be validated: `scale` divides
    /// `history_len` and the block count fits in [`MAX_WINDOW_BLOCKS`].
    pub fn new(scale: u32, history_len: usize) -> Self {
        let block_count = history_len / scale as usize;
        let mut blocks = Vec::new();
        blocks.resize(block_count, 0).ok();

        Self {
            scale,
            history_len,
            blocks,
        }
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn block_slot(&self, cycle: CycleIndex) -> usize {
        (cycle.value() / self.scale) as usize % self.blocks.len()
    }

    /// Recompute the block sum if `cycle` closes a block of this scale.
    ///
    /// Returns the new block sum when one was computed.
    pub fn maybe_recompute<const N: usize>(
        &mut self,
        cycle: CycleIndex,
        history: &HistoryRing<N>,
    ) -> Option<u32> {
        debug_assert_eq!(N, self.history_len);

        if !cycle.closes_block(self.scale) {
            return None;
        }

        let end = (cycle.value() - 1) % self.history_len as u32 + 1;
        let sum = history.sum_range(end, self.scale);
        let slot = self.block_slot(cycle);
        self.blocks[slot] = sum;

        trace!(
            "window {}: block {} closed at cycle {} with sum {}",
            self.scale, slot, cycle, sum
        );

        Some(sum)
    }

    /// Most recent block sum as seen from `cycle`.
    ///
    /// Reads 0 until the first block of the current lap has closed.
    pub fn current(&self, cycle: CycleIndex) -> u32 {
        if cycle.value() < self.scale {
            return 0;
        }
        self.blocks[self.block_slot(cycle)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_history<const N: usize>(cycles: u32, deviation: impl Fn(u32) -> u16) -> HistoryRing<N> {
        let mut history = HistoryRing::new();
        for i in 0..cycles {
            history.push(deviation(i), CycleIndex::new(i));
        }
        history
    }

    #[test]
    fn test_block_count_is_history_over_scale() {
        assert_eq!(WindowAggregator::new(32, 2048).block_count(), 64);
        assert_eq!(WindowAggregator::new(128, 2048).block_count(), 16);
        assert_eq!(WindowAggregator::new(512, 2048).block_count(), 4);
        assert_eq!(WindowAggregator::new(2048, 2048).block_count(), 1);
    }

    #[test]
    fn test_fires_only_on_block_boundaries() {
        let history = filled_history::<64>(64, |_| 1);
        let mut window = WindowAggregator::new(16, 64);

        assert_eq!(window.maybe_recompute(CycleIndex::ZERO, &history), None);
        assert_eq!(window.maybe_recompute(CycleIndex::new(15), &history), None);
        assert_eq!(window.maybe_recompute(CycleIndex::new(16), &history), Some(16));
        assert_eq!(window.maybe_recompute(CycleIndex::new(17), &history), None);
    }

    #[test]
    fn test_reads_zero_before_first_block() {
        let history = filled_history::<64>(16, |_| 7);
        let mut window = WindowAggregator::new(16, 64);

        for i in 0..16 {
            assert_eq!(window.current(CycleIndex::new(i)), 0);
        }

        window.maybe_recompute(CycleIndex::new(16), &history);
        assert_eq!(window.current(CycleIndex::new(16)), 16 * 7);
        // Visible until the next block closes
        assert_eq!(window.current(CycleIndex::new(31)), 16 * 7);
    }

    #[test]
    fn test_block_sum_covers_most_recent_scale_cycles() {
        // Deviation equals the cycle index, so each block sum is easy to check
        let history = filled_history::<64>(48, |i| i as u16);
        let mut window = WindowAggregator::new(16, 64);

        let expected: u32 = (32..48).sum();
        assert_eq!(window.maybe_recompute(CycleIndex::new(48), &history), Some(expected));
    }

    #[test]
    fn test_full_ring_window_sums_whole_lap_after_wrap() {
        // Second lap: cycles 64..128 land in slots 0..64 again
        let history = filled_history::<64>(128, |i| if i >= 64 { 2 } else { 100 });
        let mut window = WindowAggregator::new(64, 64);

        assert_eq!(window.maybe_recompute(CycleIndex::new(128), &history), Some(128));
        assert_eq!(window.current(CycleIndex::new(128)), 128);
    }
}
