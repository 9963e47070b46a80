//! Read-only access to pool state.

use crate::cell::{Cell, Word};
use crate::id::{Addr, StackId};

/// Bounds of one stack region `(base, top]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StackBounds {
    /// Which stack these bounds belong to.
    pub stack: StackId,
    /// Exclusive lower bound.
    pub base: Addr,
    /// Inclusive upper occupied bound; equals `base` when empty.
    pub top: Addr,
}

impl StackBounds {
    /// Number of elements on the stack.
    pub fn occupancy(&self) -> usize {
        self.top - self.base
    }

    /// Whether the stack holds no elements.
    pub fn is_empty(&self) -> bool {
        self.top == self.base
    }

    /// Addresses occupied by the stack, bottom to top.
    pub fn occupied(&self) -> std::ops::RangeInclusive<Addr> {
        self.base + 1..=self.top
    }
}

/// Read-only view of a pool: its address range, cells, and stack bounds.
///
/// Implemented by the live borrowed snapshot and by owned snapshots, so
/// observers, hashing, and test checkers work against either.
pub trait PoolView {
    /// Lowest address `L0`. Never occupied; it is the base of stack 1.
    fn origin(&self) -> Addr;

    /// Highest address `Lend`, the fixed sentinel `base[n+1]`.
    fn limit(&self) -> Addr;

    /// Number of stacks sharing the pool.
    fn stack_count(&self) -> usize;

    /// Bounds of `stack`, or `None` when the id is out of range.
    fn bounds(&self, stack: StackId) -> Option<StackBounds>;

    /// Contents of the cell at `addr`, or `None` when `addr` lies
    /// outside `origin()..=limit()`.
    fn cell(&self, addr: Addr) -> Option<Cell>;

    /// Total usable cells, `Lend - L0`.
    fn capacity(&self) -> usize {
        self.limit() - self.origin()
    }

    /// Sum of every stack's occupancy.
    fn total_occupied(&self) -> usize {
        (0..self.stack_count())
            .filter_map(|i| self.bounds(StackId::from_index(i)))
            .map(|b| b.occupancy())
            .sum()
    }

    /// Values on `stack`, bottom to top.
    ///
    /// Returns `None` for an out-of-range id. Empty cells inside a
    /// stack's region would indicate corruption and are skipped.
    fn stack_contents(&self, stack: StackId) -> Option<Vec<Word>> {
        let b = self.bounds(stack)?;
        Some(b.occupied().filter_map(|a| self.cell(a).flatten()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occupancy_is_top_minus_base() {
        let b = StackBounds {
            stack: StackId(2),
            base: 3,
            top: 7,
        };
        assert_eq!(b.occupancy(), 4);
        assert!(!b.is_empty());
        assert_eq!(b.occupied().collect::<Vec<_>>(), vec![4, 5, 6, 7]);
    }

    #[test]
    fn empty_region_has_no_addresses() {
        let b = StackBounds {
            stack: StackId(1),
            base: 5,
            top: 5,
        };
        assert!(b.is_empty());
        assert_eq!(b.occupied().count(), 0);
    }
}
