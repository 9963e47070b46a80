//! Growth-proportional global reallocation (Knuth's Algorithm G).
//!
//! On overflow, [`GlobalReallocator`] redistributes all free cells:
//! a flat share split equally between stacks, the rest in proportion to
//! how much each stack grew since the previous reallocation. It then
//! migrates every stack to its new base in two passes:
//!
//! ```text
//! plan:     SUM = free cells, INC = Σ delta
//!           alpha = f·SUM/n, beta = (1-f)·SUM/INC
//!           newBase[j] = newBase[j-1] + size[j-1] + ⌊τ⌋ - ⌊σ⌋
//! pass A:   j = 1..n  stacks moving down, ascending addresses
//! pass B:   j = n..1  stacks moving up, descending addresses
//! ```
//!
//! Moving-down stacks go first and lowest-first, moving-up stacks go
//! highest-first, so no cell is overwritten before it has been read.

use smallvec::SmallVec;
use stackpool_core::{Addr, StackError};

use crate::growth::{GrowthTracker, INLINE_STACKS};
use crate::policy::{OverflowPolicy, Resolution};
use crate::pool::StoragePool;
use crate::table::StackTable;

// ── ReallocationPlan ───────────────────────────────────────────────

/// New boundaries computed for one reallocation, with the quantities
/// they were derived from.
#[derive(Clone, Debug, PartialEq)]
pub struct ReallocationPlan {
    /// `newBase[j]` for every stack, in table order.
    pub new_bases: SmallVec<[Addr; INLINE_STACKS]>,
    /// Free cells after counting the pending slot (`SUM`).
    pub free: usize,
    /// Total growth since the previous reallocation (`INC`).
    pub growth: usize,
    /// Cells granted to every stack regardless of growth.
    pub alpha: f64,
    /// Cells granted per unit of growth; zero when nothing grew.
    pub beta: f64,
}

impl ReallocationPlan {
    /// Compute new bases for `table` with the given growth deltas.
    ///
    /// Returns `Ok(None)` when the pool has no free cell for the pending
    /// slot. `flat_share` is the fraction of free cells split equally.
    ///
    /// # Errors
    ///
    /// [`StackError::InvariantViolation`] if the table claims more cells
    /// than the pool holds (beyond the single pending slot) or if the
    /// computed bases would not fit every stack.
    pub fn compute(
        table: &StackTable,
        deltas: &[usize],
        flat_share: f64,
    ) -> Result<Option<Self>, StackError> {
        let n = table.len();
        let capacity = table.limit() - table.origin();
        let occupied = table.total_occupied();

        // `occupied` includes the pending slot, so a full pool is one over.
        if occupied > capacity + 1 {
            return Err(StackError::invariant(format!(
                "{occupied} cells claimed in a pool of {capacity}"
            )));
        }
        if occupied > capacity {
            return Ok(None);
        }
        let free = capacity - occupied;
        let growth: usize = deltas.iter().sum();

        let alpha = flat_share * free as f64 / n as f64;
        let beta = if growth > 0 {
            (1.0 - flat_share) * free as f64 / growth as f64
        } else {
            0.0
        };

        let mut new_bases: SmallVec<[Addr; INLINE_STACKS]> = SmallVec::with_capacity(n);
        new_bases.push(table.base(0));
        let mut sigma = 0.0f64;
        for j in 1..n {
            let tau = sigma + alpha + deltas[j - 1] as f64 * beta;
            let share = tau.floor() as usize - sigma.floor() as usize;
            new_bases.push(new_bases[j - 1] + table.occupancy(j - 1) + share);
            sigma = tau;
        }

        let plan = Self {
            new_bases,
            free,
            growth,
            alpha,
            beta,
        };
        plan.verify(table)?;
        Ok(Some(plan))
    }

    /// Check that every stack fits between its new base and the next.
    fn verify(&self, table: &StackTable) -> Result<(), StackError> {
        let n = self.new_bases.len();
        for j in 0..n {
            let next = self.new_bases.get(j + 1).copied().unwrap_or(table.limit());
            let end = self.new_bases[j] + table.occupancy(j);
            if end > next {
                return Err(StackError::invariant(format!(
                    "planned stack {} ends at {end}, past next base {next}",
                    j + 1
                )));
            }
        }
        Ok(())
    }

    /// Move every stack of `table` to its planned base.
    ///
    /// The caller must have excluded any pending slot from `table`, so that
    /// only live cells are copied. Returns the number of cells moved.
    pub fn apply(&self, pool: &mut StoragePool, table: &mut StackTable) -> usize {
        let mut moved = 0;
        for (j, &new_base) in self.new_bases.iter().enumerate() {
            let base = table.base(j);
            if new_base < base {
                moved += pool.shift_down(base + 1..=table.top(j), base - new_base);
                table.rebase(j, new_base);
            }
        }
        for (j, &new_base) in self.new_bases.iter().enumerate().rev() {
            let base = table.base(j);
            if new_base > base {
                moved += pool.shift_up(base + 1..=table.top(j), new_base - base);
                table.rebase(j, new_base);
            }
        }
        moved
    }
}

// ── GlobalReallocator ──────────────────────────────────────────────

/// Overflow policy that reallocates every stack by recent growth.
#[derive(Clone, Debug)]
pub struct GlobalReallocator {
    tracker: GrowthTracker,
    flat_share: f64,
}

impl GlobalReallocator {
    /// Create a reallocator splitting `flat_share` of free space equally
    /// and the remainder by growth.
    pub fn new(flat_share: f64) -> Self {
        Self {
            tracker: GrowthTracker::new(),
            flat_share,
        }
    }

    /// The growth history this policy reallocates by.
    pub fn tracker(&self) -> &GrowthTracker {
        &self.tracker
    }
}

impl Default for GlobalReallocator {
    fn default() -> Self {
        Self::new(crate::PoolConfig::DEFAULT_FLAT_SHARE)
    }
}

impl OverflowPolicy for GlobalReallocator {
    fn name(&self) -> &str {
        "growth"
    }

    fn attach(&mut self, table: &StackTable) {
        self.tracker.record(table);
    }

    fn resolve(
        &mut self,
        k: usize,
        pool: &mut StoragePool,
        table: &mut StackTable,
    ) -> Result<Resolution, StackError> {
        let deltas = self.tracker.deltas(table);
        let Some(plan) = ReallocationPlan::compute(table, &deltas, self.flat_share)? else {
            return Ok(Resolution::Unsolved);
        };

        // The pending slot is accounted for in the plan but holds no data.
        table.release(k);
        let cells_moved = plan.apply(pool, table);
        if table.reserve(k) {
            return Err(StackError::invariant(format!(
                "stack {} still overflows after reallocation",
                k + 1
            )));
        }
        self.tracker.record(table);

        tracing::info!(
            stack = k + 1,
            free = plan.free,
            growth = plan.growth,
            alpha = plan.alpha,
            beta = plan.beta,
            new_bases = ?plan.new_bases.as_slice(),
            cells_moved,
            "reallocated stacks by growth"
        );
        Ok(Resolution::Reallocated { plan, cells_moved })
    }
}
