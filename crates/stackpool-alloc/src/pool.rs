//! The flat cell array shared by all stacks.
//!
//! A [`StoragePool`] covers the absolute addresses `L0..=Lend`. It knows
//! nothing about stacks; [`StackTable`](crate::table::StackTable) owns the
//! boundaries. The pool provides single-cell access plus the two bounded
//! shift routines that every overflow policy is built from.

use std::ops::RangeInclusive;

use stackpool_core::{Addr, Cell, Word};

/// Contiguous storage for addresses `origin..=limit`.
///
/// Allocated once at construction and never resized. Every cell starts
/// empty.
#[derive(Clone, Debug)]
pub struct StoragePool {
    /// Backing storage; `cells[a - origin]` holds address `a`.
    cells: Vec<Cell>,
    /// Address of `cells[0]`.
    origin: Addr,
}

impl StoragePool {
    /// Create an empty pool covering `l0..=l_end`.
    ///
    /// # Panics
    ///
    /// Panics if `l_end < l0`. [`PoolConfig::validate`](crate::PoolConfig::validate)
    /// rejects such ranges before a pool is built.
    pub fn new(l0: Addr, l_end: Addr) -> Self {
        assert!(l_end >= l0, "pool range {l0}..={l_end} is inverted");
        Self {
            cells: vec![None; l_end - l0 + 1],
            origin: l0,
        }
    }

    /// Lowest address `L0`.
    pub fn origin(&self) -> Addr {
        self.origin
    }

    /// Highest address `Lend`.
    pub fn limit(&self) -> Addr {
        self.origin + self.cells.len() - 1
    }

    /// Usable cells, `Lend - L0`.
    pub fn capacity(&self) -> usize {
        self.cells.len() - 1
    }

    /// Cell at `addr`, or `None` when `addr` lies outside the pool.
    pub fn get(&self, addr: Addr) -> Option<Cell> {
        let i = addr.checked_sub(self.origin)?;
        self.cells.get(i).copied()
    }

    /// Read the cell at `addr`.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is outside `origin..=limit`.
    pub fn read(&self, addr: Addr) -> Cell {
        self.cells[self.slot(addr)]
    }

    /// Store `value` at `addr`.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is outside `origin..=limit`.
    pub fn write(&mut self, addr: Addr, value: Word) {
        let i = self.slot(addr);
        self.cells[i] = Some(value);
    }

    /// Empty the cell at `addr`, returning what it held.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is outside `origin..=limit`.
    pub fn clear(&mut self, addr: Addr) -> Cell {
        let i = self.slot(addr);
        self.cells[i].take()
    }

    /// Move every cell in `range` up by `d` addresses.
    ///
    /// Traverses `range` from the highest address down so that no cell is
    /// overwritten before it has been read. Source cells left behind are
    /// cleared. Returns the number of cells moved.
    ///
    /// # Panics
    ///
    /// Panics if `range.end() + d` is outside the pool.
    pub fn shift_up(&mut self, range: RangeInclusive<Addr>, d: usize) -> usize {
        if d == 0 || range.is_empty() {
            return 0;
        }
        let mut moved = 0;
        for addr in range.rev() {
            let value = self.clear(addr);
            let dst = self.slot(addr + d);
            self.cells[dst] = value;
            moved += 1;
        }
        moved
    }

    /// Move every cell in `range` down by `d` addresses.
    ///
    /// Traverses `range` from the lowest address up; the mirror image of
    /// [`shift_up`](Self::shift_up). Returns the number of cells moved.
    ///
    /// # Panics
    ///
    /// Panics if `range.start() - d` is below the pool origin.
    pub fn shift_down(&mut self, range: RangeInclusive<Addr>, d: usize) -> usize {
        if d == 0 || range.is_empty() {
            return 0;
        }
        let mut moved = 0;
        for addr in range {
            let value = self.clear(addr);
            let dst = self.slot(addr - d);
            self.cells[dst] = value;
            moved += 1;
        }
        moved
    }

    /// All cells with their addresses, lowest address first.
    pub fn iter(&self) -> impl Iterator<Item = (Addr, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &c)| (self.origin + i, c))
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn slot(&self, addr: Addr) -> usize {
        let i = addr
            .checked_sub(self.origin)
            .filter(|&i| i < self.cells.len());
        match i {
            Some(i) => i,
            None => panic!(
                "address {addr} outside pool {}..={}",
                self.origin,
                self.limit()
            ),
        }
    }
}
