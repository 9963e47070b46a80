//! Test utilities for stackpool development.
//!
//! Provides invariant checkers that work against any [`PoolView`], a
//! [`ReferenceModel`] that predicts the outcome of every operation without
//! modelling addresses, and a [`RecordingObserver`] that keeps every
//! observation for later inspection. Scripted scenarios and seeded random
//! workloads live in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex, MutexGuard};

use stackpool_alloc::{Observation, Op, PoolEvent, PoolObserver, Snapshot};
use stackpool_core::{PoolView, StackError, StackId};

// ── Invariant checkers ─────────────────────────────────────────────

/// Check `base[1] = L0 <= top[1] <= base[2] <= ... <= top[n] <= Lend`.
pub fn check_boundaries(view: &dyn PoolView) -> Result<(), String> {
    let mut floor = view.origin();
    for i in 0..view.stack_count() {
        let id = StackId::from_index(i);
        let b = view
            .bounds(id)
            .ok_or_else(|| format!("stack {id} has no bounds"))?;
        if i == 0 && b.base != view.origin() {
            return Err(format!("base[1] = {}, expected {}", b.base, view.origin()));
        }
        if b.base < floor || b.top < b.base {
            return Err(format!(
                "stack {id} bounds ({}, {}] out of order (previous top {floor})",
                b.base, b.top
            ));
        }
        floor = b.top;
    }
    if floor > view.limit() {
        return Err(format!("last top {floor} past Lend {}", view.limit()));
    }
    Ok(())
}

/// Check that exactly the cells inside some stack's region are occupied.
///
/// Catches stale copies left behind by a shift as well as holes inside
/// a stack.
pub fn check_cells(view: &dyn PoolView) -> Result<(), String> {
    let mut owned = vec![false; view.capacity() + 1];
    for i in 0..view.stack_count() {
        if let Some(b) = view.bounds(StackId::from_index(i)) {
            for addr in b.occupied() {
                owned[addr - view.origin()] = true;
            }
        }
    }
    for (offset, &in_stack) in owned.iter().enumerate() {
        let addr = view.origin() + offset;
        let occupied = matches!(view.cell(addr), Some(Some(_)));
        if occupied != in_stack {
            return Err(format!(
                "cell {addr} is {} but {} a stack region",
                if occupied { "occupied" } else { "empty" },
                if in_stack { "inside" } else { "outside" }
            ));
        }
    }
    Ok(())
}

/// Panic unless both [`check_boundaries`] and [`check_cells`] pass.
pub fn assert_consistent(view: &dyn PoolView) {
    if let Err(e) = check_boundaries(view).and_then(|()| check_cells(view)) {
        panic!("inconsistent pool: {e}");
    }
}

/// Every stack's values, bottom to top, as raw integers.
pub fn stack_values(view: &dyn PoolView) -> Vec<Vec<i64>> {
    (0..view.stack_count())
        .map(|i| {
            view.stack_contents(StackId::from_index(i))
                .unwrap_or_default()
                .into_iter()
                .map(|w| w.get())
                .collect()
        })
        .collect()
}

// ── ReferenceModel ─────────────────────────────────────────────────

/// Address-free model of `n` stacks sharing `capacity` cells.
///
/// Whatever layout a policy chooses, the values on each stack and the
/// success of each operation are fully determined: a push fails exactly
/// when every cell is in use, since both built-in policies find any free
/// cell in the pool.
#[derive(Clone, Debug)]
pub struct ReferenceModel {
    stacks: Vec<Vec<i64>>,
    capacity: usize,
}

impl ReferenceModel {
    pub fn new(stacks: usize, capacity: usize) -> Self {
        Self {
            stacks: vec![Vec::new(); stacks],
            capacity,
        }
    }

    pub fn total(&self) -> usize {
        self.stacks.iter().map(Vec::len).sum()
    }

    pub fn stacks(&self) -> &[Vec<i64>] {
        &self.stacks
    }

    /// Predict and apply one operation.
    pub fn apply(&mut self, op: Op) -> Result<Option<i64>, StackError> {
        let stack = op.stack();
        let k = stack
            .index()
            .filter(|&k| k < self.stacks.len())
            .ok_or(StackError::InvalidIndex {
                stack,
                stack_count: self.stacks.len(),
            })?;
        match op {
            Op::Push(_, 0) => Err(StackError::InvalidValue),
            Op::Push(_, value) => {
                if self.total() == self.capacity {
                    return Err(StackError::OutOfStorage { stack });
                }
                self.stacks[k].push(value);
                Ok(None)
            }
            Op::Pop(_) => self.stacks[k]
                .pop()
                .map(Some)
                .ok_or(StackError::Underflow { stack }),
        }
    }
}

// ── RecordingObserver ──────────────────────────────────────────────

/// Observer that keeps every observation.
///
/// Clones share one log, so keep a clone before attaching.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    log: Arc<Mutex<Vec<Observation>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locked access to the log.
    pub fn observations(&self) -> MutexGuard<'_, Vec<Observation>> {
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn events(&self) -> Vec<PoolEvent> {
        self.observations().iter().map(|o| o.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.observations().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PoolObserver for RecordingObserver {
    fn observe(&mut self, event: &PoolEvent, snapshot: &Snapshot<'_>) {
        self.observations().push(Observation {
            event: event.clone(),
            snapshot: snapshot.to_owned(),
        });
    }
}
