//! Per-stack bounds and the boundary invariant.
//!
//! [`StackTable`] holds `base[j]` and `top[j]` for every stack plus the
//! fixed sentinel `base[n+1] = Lend`. Stacks are addressed by 0-based
//! table position internally; [`StackTable::resolve`] maps a public
//! 1-based [`StackId`] onto that position.

use std::ops::RangeInclusive;

use stackpool_core::{Addr, StackBounds, StackError, StackId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Region {
    base: Addr,
    top: Addr,
}

/// Bounds of every stack sharing a pool.
///
/// Between public operations the table satisfies
/// `base[1] = L0 <= top[1] <= base[2] <= ... <= top[n] <= base[n+1] = Lend`.
/// During a push the overflowing stack's top may sit one past the next
/// base while the overflow policy makes room; see [`reserve`](Self::reserve).
#[derive(Clone, Debug)]
pub struct StackTable {
    regions: Vec<Region>,
    /// `L0`, the fixed base of stack 1.
    origin: Addr,
    /// `Lend`, the sentinel `base[n+1]`. Never mutated.
    limit: Addr,
}

impl StackTable {
    /// Create a table of empty stacks at the given bases.
    ///
    /// `bases` must be non-decreasing, start at `origin`, and stay at or
    /// below `limit`; [`check`](Self::check) reports any violation.
    pub fn new(origin: Addr, limit: Addr, bases: &[Addr]) -> Self {
        Self {
            regions: bases.iter().map(|&b| Region { base: b, top: b }).collect(),
            origin,
            limit,
        }
    }

    /// Number of stacks `n`.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the table has no stacks. Never true for a validated config.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// `L0`.
    pub fn origin(&self) -> Addr {
        self.origin
    }

    /// `Lend`.
    pub fn limit(&self) -> Addr {
        self.limit
    }

    /// Map a public stack id onto its table position.
    pub fn resolve(&self, stack: StackId) -> Result<usize, StackError> {
        stack
            .index()
            .filter(|&k| k < self.regions.len())
            .ok_or(StackError::InvalidIndex {
                stack,
                stack_count: self.regions.len(),
            })
    }

    /// `base[k]`.
    pub fn base(&self, k: usize) -> Addr {
        self.regions[k].base
    }

    /// `top[k]`.
    pub fn top(&self, k: usize) -> Addr {
        self.regions[k].top
    }

    /// `base[k+1]`, which is `Lend` for the last stack.
    pub fn next_base(&self, k: usize) -> Addr {
        self.regions.get(k + 1).map_or(self.limit, |r| r.base)
    }

    /// `top[k] - base[k]`.
    pub fn occupancy(&self, k: usize) -> usize {
        let r = self.regions[k];
        r.top - r.base
    }

    /// `base[k+1] - top[k]`: free cells above stack `k` before the next
    /// stack begins. Zero while stack `k` holds a pending overflow slot.
    pub fn slack(&self, k: usize) -> usize {
        self.next_base(k).saturating_sub(self.regions[k].top)
    }

    /// Sum of every stack's occupancy.
    pub fn total_occupied(&self) -> usize {
        (0..self.regions.len()).map(|k| self.occupancy(k)).sum()
    }

    /// Public bounds of stack `k`.
    pub fn bounds(&self, k: usize) -> StackBounds {
        let r = self.regions[k];
        StackBounds {
            stack: StackId::from_index(k),
            base: r.base,
            top: r.top,
        }
    }

    /// Public bounds of every stack, in order.
    pub fn iter(&self) -> impl Iterator<Item = StackBounds> + '_ {
        (0..self.regions.len()).map(|k| self.bounds(k))
    }

    /// Tentatively claim one more slot for stack `k`.
    ///
    /// Returns `true` when the new top ran past `base[k+1]`, meaning the
    /// slot is not yet backed by free storage and an overflow policy must
    /// make room before anything is written there.
    pub fn reserve(&mut self, k: usize) -> bool {
        self.regions[k].top += 1;
        self.regions[k].top > self.next_base(k)
    }

    /// Undo a [`reserve`](Self::reserve), or drop the top slot after a pop.
    pub fn release(&mut self, k: usize) {
        self.regions[k].top -= 1;
    }

    /// Move the bounds of every stack in `ks` up by `d`.
    pub fn raise(&mut self, ks: RangeInclusive<usize>, d: usize) {
        for r in &mut self.regions[ks] {
            r.base += d;
            r.top += d;
        }
    }

    /// Move the bounds of every stack in `ks` down by `d`.
    pub fn lower(&mut self, ks: RangeInclusive<usize>, d: usize) {
        for r in &mut self.regions[ks] {
            r.base -= d;
            r.top -= d;
        }
    }

    /// Re-home stack `k` at `new_base`, keeping its occupancy.
    pub fn rebase(&mut self, k: usize, new_base: Addr) {
        let r = &mut self.regions[k];
        let len = r.top - r.base;
        r.base = new_base;
        r.top = new_base + len;
    }

    /// Verify the boundary invariant.
    pub fn check(&self) -> Result<(), StackError> {
        let first = match self.regions.first() {
            Some(r) => r.base,
            None => return Err(StackError::invariant("table has no stacks")),
        };
        if first != self.origin {
            return Err(StackError::invariant(format!(
                "base[1] = {first}, expected L0 = {}",
                self.origin
            )));
        }
        for k in 0..self.regions.len() {
            let r = self.regions[k];
            let next = self.next_base(k);
            if r.base > r.top || r.top > next {
                return Err(StackError::invariant(format!(
                    "stack {} bounds ({}, {}] break ordering against next base {next}",
                    k + 1,
                    r.base,
                    r.top
                )));
            }
        }
        Ok(())
    }
}
