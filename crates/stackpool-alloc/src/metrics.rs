//! Cumulative allocator counters.
//!
//! [`AllocMetrics`] counts operations and overflow handling over the
//! lifetime of a [`MultiStack`](crate::MultiStack), for telemetry and for
//! comparing how much copying each policy does on the same workload.

use crate::policy::{Resolution, ShiftDirection};

/// Operation and overflow counters.
///
/// All counters are cumulative since construction. Rejected operations
/// are counted in their own fields and never in `pushes`/`pops`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocMetrics {
    /// Successful pushes.
    pub pushes: u64,
    /// Successful pops.
    pub pops: u64,
    /// Pops rejected because the stack was empty.
    pub underflows: u64,
    /// Pushes that found no free cell above their stack.
    pub overflows: u64,
    /// Overflows resolved by shifting stacks up one cell.
    pub forward_shifts: u64,
    /// Overflows resolved by shifting stacks down one cell.
    pub backward_shifts: u64,
    /// Overflows resolved by a global reallocation.
    pub reallocations: u64,
    /// Pushes rejected because no room could be found.
    pub out_of_storage: u64,
    /// Cells copied while resolving overflows.
    pub cells_moved: u64,
}

impl AllocMetrics {
    /// Fold one overflow resolution into the counters.
    pub fn record_resolution(&mut self, resolution: &Resolution) {
        match resolution {
            Resolution::Shifted { direction, .. } => match direction {
                ShiftDirection::Forward => self.forward_shifts += 1,
                ShiftDirection::Backward => self.backward_shifts += 1,
            },
            Resolution::Reallocated { .. } => self.reallocations += 1,
            Resolution::Unsolved => self.out_of_storage += 1,
        }
        self.cells_moved += resolution.cells_moved() as u64;
    }

    /// Overflows that ended with room for the push.
    pub fn resolved_overflows(&self) -> u64 {
        self.forward_shifts + self.backward_shifts + self.reallocations
    }
}
