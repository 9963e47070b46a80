//! Read-only snapshots of pool state.
//!
//! [`Snapshot`] borrows the live pool and table, so it cannot outlive the
//! next mutation. [`OwnedSnapshot`] copies everything out for retention,
//! for example to hand across a channel to a presentation thread.

use std::fmt;

use stackpool_core::{Addr, Cell, PoolView, StackBounds, StackId};

use crate::pool::StoragePool;
use crate::table::StackTable;

// ── Snapshot ───────────────────────────────────────────────────────

/// Borrowed view of the pool after a mutation.
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    pool: &'a StoragePool,
    table: &'a StackTable,
}

impl<'a> Snapshot<'a> {
    pub(crate) fn new(pool: &'a StoragePool, table: &'a StackTable) -> Self {
        Self { pool, table }
    }

    /// Every cell as `(address, contents)`, in address order.
    pub fn cells(&self) -> impl Iterator<Item = (Addr, Cell)> + 'a {
        self.pool.iter()
    }

    /// Every stack's bounds, in stack order.
    pub fn stacks(&self) -> impl Iterator<Item = StackBounds> + 'a {
        self.table.iter()
    }

    /// Copy the view out so it can be kept past the next mutation.
    pub fn to_owned(&self) -> OwnedSnapshot {
        OwnedSnapshot {
            origin: self.pool.origin(),
            cells: self.pool.iter().map(|(_, c)| c).collect(),
            stacks: self.table.iter().collect(),
        }
    }
}

impl PoolView for Snapshot<'_> {
    fn origin(&self) -> Addr {
        self.pool.origin()
    }

    fn limit(&self) -> Addr {
        self.pool.limit()
    }

    fn stack_count(&self) -> usize {
        self.table.len()
    }

    fn bounds(&self, stack: StackId) -> Option<StackBounds> {
        let k = self.table.resolve(stack).ok()?;
        Some(self.table.bounds(k))
    }

    fn cell(&self, addr: Addr) -> Option<Cell> {
        self.pool.get(addr)
    }
}

impl fmt::Debug for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_view(f, self)
    }
}

impl fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_view(f, self)
    }
}

// ── OwnedSnapshot ──────────────────────────────────────────────────

/// Self-contained copy of the pool state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedSnapshot {
    /// Address of `cells[0]`, i.e. `L0`.
    pub origin: Addr,
    /// Contents of every address from `origin` through `Lend`.
    pub cells: Vec<Cell>,
    /// Every stack's bounds, in stack order.
    pub stacks: Vec<StackBounds>,
}

impl PoolView for OwnedSnapshot {
    fn origin(&self) -> Addr {
        self.origin
    }

    fn limit(&self) -> Addr {
        // An owned snapshot always holds at least the L0 cell.
        self.origin + self.cells.len().saturating_sub(1)
    }

    fn stack_count(&self) -> usize {
        self.stacks.len()
    }

    fn bounds(&self, stack: StackId) -> Option<StackBounds> {
        self.stacks.get(stack.index()?).copied()
    }

    fn cell(&self, addr: Addr) -> Option<Cell> {
        let i = addr.checked_sub(self.origin)?;
        self.cells.get(i).copied()
    }
}

impl fmt::Display for OwnedSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_view(f, self)
    }
}

/// Compact one-line rendering: occupied cells then `stack:(base,top]`.
///
/// `[11 12 21 41 . . . . . .] 1:(0,2] 2:(2,3] 3:(3,3] 4:(3,4]`
fn write_view(f: &mut fmt::Formatter<'_>, view: &dyn PoolView) -> fmt::Result {
    f.write_str("[")?;
    for (i, addr) in (view.origin() + 1..=view.limit()).enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        match view.cell(addr).flatten() {
            Some(w) => write!(f, "{w}")?,
            None => f.write_str(".")?,
        }
    }
    f.write_str("]")?;
    for i in 0..view.stack_count() {
        if let Some(b) = view.bounds(StackId::from_index(i)) {
            write!(f, " {}:({},{}]", b.stack, b.base, b.top)?;
        }
    }
    Ok(())
}
