//! Per-stack growth history for growth-proportional reallocation.

use smallvec::SmallVec;
use stackpool_core::Addr;

use crate::table::StackTable;

/// Inline capacity for per-stack vectors; pools rarely have more stacks.
pub(crate) const INLINE_STACKS: usize = 8;

/// Per-stack growth deltas, in table order.
pub type Deltas = SmallVec<[usize; INLINE_STACKS]>;

/// Remembers every stack's top as of the last reallocation.
///
/// `delta[j] = max(0, top[j] - old_top[j])` measures how much stack `j`
/// grew since then. Owned by [`GlobalReallocator`](crate::GlobalReallocator);
/// the local policy has no growth memory.
#[derive(Clone, Debug, Default)]
pub struct GrowthTracker {
    old_top: SmallVec<[Addr; INLINE_STACKS]>,
}

impl GrowthTracker {
    /// Create a tracker with no history. Call [`record`](Self::record)
    /// before computing deltas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every stack's current top as the new baseline.
    pub fn record(&mut self, table: &StackTable) {
        self.old_top.clear();
        self.old_top.extend((0..table.len()).map(|k| table.top(k)));
    }

    /// Baseline top of stack `k`, if recorded.
    pub fn old_top(&self, k: usize) -> Option<Addr> {
        self.old_top.get(k).copied()
    }

    /// Growth of every stack since the baseline.
    ///
    /// A stack with no recorded baseline counts as not having grown.
    pub fn deltas(&self, table: &StackTable) -> Deltas {
        (0..table.len())
            .map(|k| match self.old_top(k) {
                Some(old) => table.top(k).saturating_sub(old),
                None => 0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_baseline_has_no_growth() {
        let table = StackTable::new(0, 10, &[0, 0, 0]);
        let mut tracker = GrowthTracker::new();
        tracker.record(&table);
        assert_eq!(tracker.deltas(&table).as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn deltas_count_only_growth() {
        let mut table = StackTable::new(0, 10, &[0, 0, 0]);
        table.reserve(2);
        table.reserve(2);
        let mut tracker = GrowthTracker::new();
        tracker.record(&table);
        table.release(2);
        table.reserve(0);
        // Stack 3 shrank below its baseline: clamped to zero.
        assert_eq!(tracker.deltas(&table).as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn record_resets_baseline() {
        let mut table = StackTable::new(0, 10, &[0, 0]);
        let mut tracker = GrowthTracker::new();
        tracker.record(&table);
        table.reserve(1);
        assert_eq!(tracker.deltas(&table).as_slice(), &[0, 1]);
        tracker.record(&table);
        assert_eq!(tracker.old_top(1), Some(1));
        assert_eq!(tracker.deltas(&table).as_slice(), &[0, 0]);
    }

    #[test]
    fn missing_baseline_counts_as_no_growth() {
        let mut table = StackTable::new(0, 10, &[0, 0]);
        table.reserve(1);
        let tracker = GrowthTracker::new();
        assert_eq!(tracker.deltas(&table).as_slice(), &[0, 0]);
    }
}
