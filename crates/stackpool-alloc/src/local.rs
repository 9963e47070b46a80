//! Nearest-neighbour overflow resolution.
//!
//! [`LocalOverflowResolver`] looks for a single free cell, first above the
//! overflowing stack and then below it, and shifts the fewest stacks one
//! cell toward it. It keeps no memory between calls.

use stackpool_core::{StackError, StackId};

use crate::policy::{OverflowPolicy, Resolution, ShiftDirection};
use crate::pool::StoragePool;
use crate::table::StackTable;

/// One-cell shift toward the nearest slack.
///
/// The forward scan always runs first, so identical operation sequences
/// always produce identical layouts.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalOverflowResolver;

impl LocalOverflowResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Shift stacks `k+1..=j` up one cell, where `j` is the first stack
    /// above `k` with slack.
    fn shift_forward(
        k: usize,
        pool: &mut StoragePool,
        table: &mut StackTable,
    ) -> Option<Resolution> {
        let j = (k + 1..table.len()).find(|&j| table.slack(j) > 0)?;
        let moved = pool.shift_up(table.base(k + 1) + 1..=table.top(j), 1);
        table.raise(k + 1..=j, 1);
        Some(Resolution::Shifted {
            direction: ShiftDirection::Forward,
            first: StackId::from_index(k + 1),
            last: StackId::from_index(j),
            cells_moved: moved,
        })
    }

    /// Shift stacks `j+1..=k` down one cell, where `j` is the first stack
    /// below `k` with slack. The pending slot at `top[k]` is not copied.
    fn shift_backward(
        k: usize,
        pool: &mut StoragePool,
        table: &mut StackTable,
    ) -> Option<Resolution> {
        let j = (0..k).rev().find(|&j| table.slack(j) > 0)?;
        let moved = pool.shift_down(table.base(j + 1) + 1..=table.top(k) - 1, 1);
        table.lower(j + 1..=k, 1);
        Some(Resolution::Shifted {
            direction: ShiftDirection::Backward,
            first: StackId::from_index(j + 1),
            last: StackId::from_index(k),
            cells_moved: moved,
        })
    }
}

impl OverflowPolicy for LocalOverflowResolver {
    fn name(&self) -> &str {
        "local"
    }

    fn resolve(
        &mut self,
        k: usize,
        pool: &mut StoragePool,
        table: &mut StackTable,
    ) -> Result<Resolution, StackError> {
        let resolution = Self::shift_forward(k, pool, table)
            .or_else(|| Self::shift_backward(k, pool, table))
            .unwrap_or(Resolution::Unsolved);
        if let Resolution::Shifted {
            direction,
            first,
            last,
            cells_moved,
        } = &resolution
        {
            tracing::debug!(
                stack = k + 1,
                ?direction,
                first = first.0,
                last = last.0,
                cells_moved,
                "local shift made room"
            );
        }
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackpool_core::cell::word;
    use stackpool_core::Cell;

    struct Fixture {
        pool: StoragePool,
        table: StackTable,
        policy: LocalOverflowResolver,
    }

    impl Fixture {
        fn knuth() -> Self {
            Self {
                pool: StoragePool::new(0, 10),
                table: StackTable::new(0, 10, &[0, 0, 0, 0]),
                policy: LocalOverflowResolver::new(),
            }
        }

        /// Push the way the allocator does, returning the resolution used.
        fn push(&mut self, stack: usize, v: i64) -> Option<Resolution> {
            let k = stack - 1;
            let mut used = None;
            if self.table.reserve(k) {
                let r = self
                    .policy
                    .resolve(k, &mut self.pool, &mut self.table)
                    .unwrap();
                if !r.is_solved() {
                    self.table.release(k);
                    return Some(r);
                }
                used = Some(r);
            }
            self.pool.write(self.table.top(k), word(v).unwrap());
            used
        }

        fn cell(&self, addr: usize) -> i64 {
            stackpool_core::cell::raw(self.pool.read(addr))
        }

        fn occupancies(&self) -> Vec<usize> {
            (0..self.table.len()).map(|k| self.table.occupancy(k)).collect()
        }
    }

    #[test]
    fn knuth_opening_sequence() {
        let mut f = Fixture::knuth();
        f.push(1, 11);
        f.push(1, 12);
        f.push(4, 41);
        f.push(2, 21);
        assert_eq!(f.occupancies(), vec![2, 1, 0, 1]);
        assert_eq!(f.cell(1), 11);
        assert_eq!(f.cell(2), 12);
        assert_eq!(f.cell(3), 21);
        assert_eq!(f.cell(4), 41);
        assert!(f.table.check().is_ok());
    }

    #[test]
    fn forward_shift_moves_only_up_to_first_slack() {
        let mut f = Fixture::knuth();
        f.push(4, 41);
        let r = f.push(1, 11).unwrap();
        assert_eq!(
            r,
            Resolution::Shifted {
                direction: ShiftDirection::Forward,
                first: StackId(2),
                last: StackId(4),
                cells_moved: 1,
            }
        );
        assert_eq!(f.table.base(3), 1);
        assert_eq!(f.cell(2), 41);
        assert_eq!(f.cell(1), 11);
    }

    #[test]
    fn backward_shift_when_nothing_free_above() {
        let mut f = Fixture {
            pool: StoragePool::new(0, 6),
            table: StackTable::new(0, 6, &[0, 2, 4]),
            policy: LocalOverflowResolver::new(),
        };
        f.push(3, 31);
        f.push(3, 32);
        f.push(2, 21);
        f.push(2, 22);
        // Stack 3 is full against Lend, stack 2 is full against stack 3,
        // stack 1 has two free cells.
        let r = f.push(3, 33).unwrap();
        assert_eq!(
            r,
            Resolution::Shifted {
                direction: ShiftDirection::Backward,
                first: StackId(2),
                last: StackId(3),
                cells_moved: 4,
            }
        );
        assert_eq!(f.table.base(1), 1);
        assert_eq!(f.table.base(2), 3);
        assert_eq!(f.table.top(2), 6);
        assert_eq!(
            (1..=6).map(|a| f.cell(a)).collect::<Vec<_>>(),
            vec![0, 21, 22, 31, 32, 33]
        );
        assert!(f.table.check().is_ok());
    }

    #[test]
    fn full_pool_is_unsolved_and_untouched() {
        let mut f = Fixture {
            pool: StoragePool::new(0, 3),
            table: StackTable::new(0, 3, &[0, 0]),
            policy: LocalOverflowResolver::new(),
        };
        f.push(2, 1);
        f.push(2, 2);
        f.push(1, 3);
        let before: Vec<Cell> = f.pool.iter().map(|(_, c)| c).collect();
        let r = f.push(1, 4).unwrap();
        assert_eq!(r, Resolution::Unsolved);
        let after: Vec<Cell> = f.pool.iter().map(|(_, c)| c).collect();
        assert_eq!(before, after);
        assert_eq!(f.occupancies(), vec![1, 2]);
        assert!(f.table.check().is_ok());
    }

    #[test]
    fn pending_slot_is_empty_after_forward_shift() {
        let mut f = Fixture::knuth();
        f.push(2, 21);
        f.push(2, 22);
        // Stack 1 overflows into stack 2's first cell.
        f.table.reserve(0);
        f.policy.resolve(0, &mut f.pool, &mut f.table).unwrap();
        assert_eq!(f.pool.read(f.table.top(0)), None);
    }
}
