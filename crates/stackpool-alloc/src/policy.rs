//! The [`OverflowPolicy`] trait and its [`Resolution`] report.
//!
//! A policy runs when a push finds no free cell directly above its stack.
//! The allocator owns the pool and the table; the policy borrows both for
//! the duration of one resolution and may keep private state between
//! calls (the growth policy remembers past tops, the local one does not).

use stackpool_core::{StackError, StackId};

use crate::pool::StoragePool;
use crate::realloc::ReallocationPlan;
use crate::table::StackTable;

/// Which way a local shift moved its stacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Stacks above the overflowing one moved up one cell.
    Forward,
    /// The overflowing stack and those below it moved down one cell.
    Backward,
}

/// Outcome of one overflow resolution.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Stacks `first..=last` moved one cell in `direction`.
    Shifted {
        /// Direction of the move.
        direction: ShiftDirection,
        /// Lowest stack that moved.
        first: StackId,
        /// Highest stack that moved.
        last: StackId,
        /// Number of cells physically copied.
        cells_moved: usize,
    },
    /// Every boundary was recomputed and the stacks migrated.
    Reallocated {
        /// The boundaries that were applied.
        plan: ReallocationPlan,
        /// Number of cells physically copied.
        cells_moved: usize,
    },
    /// No room could be found. Pool and table are untouched.
    Unsolved,
}

impl Resolution {
    /// Whether the pending slot is now backed by free storage.
    pub fn is_solved(&self) -> bool {
        !matches!(self, Self::Unsolved)
    }

    /// Cells copied while resolving; zero when unsolved.
    pub fn cells_moved(&self) -> usize {
        match self {
            Self::Shifted { cells_moved, .. } | Self::Reallocated { cells_moved, .. } => {
                *cells_moved
            }
            Self::Unsolved => 0,
        }
    }
}

/// Strategy for making room when a stack runs into its neighbour.
///
/// # Contract
///
/// `resolve(k, ..)` is called after stack `k`'s top has been tentatively
/// incremented one past `base[k+1]`. The cells `base[k]+1 ..= top[k]-1`
/// hold live data; the pending slot `top[k]` does not.
///
/// - On a solved outcome the policy must leave the table satisfying the
///   boundary invariant with the pending slot included, every live value
///   still present in its own stack in the same order, and the cell at
///   the new `top[k]` empty.
/// - On [`Resolution::Unsolved`] the policy must not have modified the
///   pool or the table.
/// - Returning `Err` is reserved for fatal invariant violations.
///
/// The allocator re-checks the boundary invariant after every resolution
/// and disables itself if a policy breaks it.
///
/// # Object safety
///
/// The allocator stores its policy as `Box<dyn OverflowPolicy>`.
pub trait OverflowPolicy: Send + 'static {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Called once when the allocator is built, with the initial table.
    ///
    /// Default: no-op.
    fn attach(&mut self, _table: &StackTable) {}

    /// Make room for the pending slot of stack `k`.
    fn resolve(
        &mut self,
        k: usize,
        pool: &mut StoragePool,
        table: &mut StackTable,
    ) -> Result<Resolution, StackError>;
}
