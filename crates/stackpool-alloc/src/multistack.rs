//! The [`MultiStack`] allocator facade.
//!
//! Owns the storage pool, the stack table, and the overflow policy, and
//! drives the push/pop protocol:
//!
//! ```text
//! push(i, v):  check i, v ─► reserve top[i] ─► overflow? ─► policy.resolve
//!                                              │                 │
//!                                              │        unsolved ─► release, OutOfStorage
//!                                              ▼                 ▼
//!                                        write v at top[i] ◄── solved
//! pop(i):      check i ─► empty? Underflow : clear top[i], release
//! ```
//!
//! The boundary invariant is checked before and after every mutation. A
//! violation disables the allocator: every later call fails with
//! [`StackError::Disabled`].

use std::fmt;

use indexmap::IndexMap;
use stackpool_core::cell::word;
use stackpool_core::{Addr, StackBounds, StackError, StackId, Word};

use crate::config::{ConfigError, PolicyKind, PoolConfig};
use crate::hash::state_hash;
use crate::local::LocalOverflowResolver;
use crate::metrics::AllocMetrics;
use crate::observer::{PoolEvent, PoolObserver};
use crate::policy::OverflowPolicy;
use crate::pool::StoragePool;
use crate::read::Snapshot;
use crate::realloc::GlobalReallocator;
use crate::table::StackTable;

// ── Op ─────────────────────────────────────────────────────────────

/// One scripted operation, for [`MultiStack::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Push a raw value onto a stack.
    Push(StackId, i64),
    /// Pop the top of a stack.
    Pop(StackId),
}

impl Op {
    /// The stack this operation targets.
    pub fn stack(&self) -> StackId {
        match *self {
            Self::Push(stack, _) | Self::Pop(stack) => stack,
        }
    }
}

/// Result of a successful [`Op`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpOutcome {
    /// The pushed value landed at this address.
    Pushed(Addr),
    /// This value was popped.
    Popped(Word),
}

// ── MultiStack ─────────────────────────────────────────────────────

/// `n` stacks sharing one contiguous pool of cells.
///
/// # Examples
///
/// ```
/// use stackpool_alloc::{MultiStack, PoolConfig};
/// use stackpool_core::StackId;
///
/// let mut stacks = MultiStack::new(PoolConfig::new(0, 10, 4)).unwrap();
/// stacks.push(StackId(1), 11).unwrap();
/// stacks.push(StackId(4), 41).unwrap();
/// assert_eq!(stacks.pop(StackId(1)).unwrap().get(), 11);
/// assert_eq!(stacks.total_occupied(), 1);
/// ```
pub struct MultiStack {
    pool: StoragePool,
    table: StackTable,
    policy: Box<dyn OverflowPolicy>,
    observers: IndexMap<String, Box<dyn PoolObserver>>,
    metrics: AllocMetrics,
    disabled: bool,
}

impl MultiStack {
    /// Build an allocator with the policy named in `config`.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        let policy: Box<dyn OverflowPolicy> = match config.policy {
            PolicyKind::Local => Box::new(LocalOverflowResolver::new()),
            PolicyKind::Growth => Box::new(GlobalReallocator::new(config.flat_share)),
        };
        Self::with_policy(config, policy)
    }

    /// Build an allocator with a caller-supplied overflow policy.
    ///
    /// `config.policy` is ignored; `config.flat_share` is still validated.
    pub fn with_policy(
        config: PoolConfig,
        mut policy: Box<dyn OverflowPolicy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let bases = config.layout.bases(config.l0, config.l_end, config.stacks);
        let pool = StoragePool::new(config.l0, config.l_end);
        let table = StackTable::new(config.l0, config.l_end, &bases);
        policy.attach(&table);
        tracing::debug!(
            l0 = config.l0,
            l_end = config.l_end,
            stacks = config.stacks,
            policy = policy.name(),
            layout = ?config.layout,
            "stack pool created"
        );
        Ok(Self {
            pool,
            table,
            policy,
            observers: IndexMap::new(),
            metrics: AllocMetrics::default(),
            disabled: false,
        })
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Push `value` onto `stack`, returning the address it was written to.
    ///
    /// May run the overflow policy first, which can move other stacks.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` or `InvalidValue` for bad arguments, and
    /// `OutOfStorage` when the policy finds no room. None of these change
    /// the pool. `InvariantViolation` or `Disabled` if the allocator has
    /// detected corruption.
    pub fn push(&mut self, stack: StackId, value: i64) -> Result<Addr, StackError> {
        self.ensure_enabled()?;
        let k = self.table.resolve(stack)?;
        let value = word(value).ok_or(StackError::InvalidValue)?;
        self.verify("before push")?;

        if self.table.reserve(k) {
            self.metrics.overflows += 1;
            tracing::debug!(
                stack = stack.0,
                policy = self.policy.name(),
                "overflow detected"
            );
            let resolution = match self.policy.resolve(k, &mut self.pool, &mut self.table) {
                Ok(r) => r,
                Err(e) => return Err(self.fail(e)),
            };
            self.metrics.record_resolution(&resolution);
            if !resolution.is_solved() {
                self.table.release(k);
                let error = StackError::OutOfStorage { stack };
                tracing::warn!(
                    stack = stack.0,
                    policy = self.policy.name(),
                    occupied = self.table.total_occupied(),
                    "out of storage"
                );
                self.notify(PoolEvent::Rejected {
                    stack,
                    error: error.clone(),
                });
                return Err(error);
            }
            self.verify("after overflow resolution")?;
            self.notify(PoolEvent::Resolved { stack, resolution });
        }

        let addr = self.table.top(k);
        if self.pool.read(addr).is_some() {
            return Err(self.fail(StackError::invariant(format!(
                "pending slot {addr} of stack {stack} is occupied"
            ))));
        }
        self.pool.write(addr, value);
        self.metrics.pushes += 1;
        tracing::trace!(stack = stack.0, addr, value = value.get(), "push");
        self.notify(PoolEvent::Pushed { stack, addr, value });
        Ok(addr)
    }

    /// Pop and return the top of `stack`.
    ///
    /// # Errors
    ///
    /// `InvalidIndex` for a bad id and `Underflow` for an empty stack;
    /// neither changes the pool. `InvariantViolation` or `Disabled` if
    /// the allocator has detected corruption.
    pub fn pop(&mut self, stack: StackId) -> Result<Word, StackError> {
        self.ensure_enabled()?;
        let k = self.table.resolve(stack)?;
        self.verify("before pop")?;

        if self.table.occupancy(k) == 0 {
            self.metrics.underflows += 1;
            let error = StackError::Underflow { stack };
            self.notify(PoolEvent::Rejected {
                stack,
                error: error.clone(),
            });
            return Err(error);
        }

        let addr = self.table.top(k);
        let Some(value) = self.pool.clear(addr) else {
            return Err(self.fail(StackError::invariant(format!(
                "top cell {addr} of stack {stack} is empty"
            ))));
        };
        self.table.release(k);
        self.metrics.pops += 1;
        tracing::trace!(stack = stack.0, addr, value = value.get(), "pop");
        self.notify(PoolEvent::Popped { stack, addr, value });
        Ok(value)
    }

    /// Run one scripted operation.
    pub fn apply(&mut self, op: Op) -> Result<OpOutcome, StackError> {
        match op {
            Op::Push(stack, value) => self.push(stack, value).map(OpOutcome::Pushed),
            Op::Pop(stack) => self.pop(stack).map(OpOutcome::Popped),
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Top of `stack` without removing it; `None` when empty.
    pub fn peek(&self, stack: StackId) -> Result<Option<Word>, StackError> {
        let k = self.table.resolve(stack)?;
        if self.table.occupancy(k) == 0 {
            return Ok(None);
        }
        Ok(self.pool.read(self.table.top(k)))
    }

    /// Values on `stack`, bottom to top.
    pub fn contents(&self, stack: StackId) -> Result<Vec<Word>, StackError> {
        let k = self.table.resolve(stack)?;
        let b = self.table.bounds(k);
        Ok(b.occupied().filter_map(|a| self.pool.read(a)).collect())
    }

    /// Number of values on `stack`.
    pub fn occupancy(&self, stack: StackId) -> Result<usize, StackError> {
        let k = self.table.resolve(stack)?;
        Ok(self.table.occupancy(k))
    }

    /// Free cells between the top of `stack` and the next stack's base.
    pub fn slack(&self, stack: StackId) -> Result<usize, StackError> {
        let k = self.table.resolve(stack)?;
        Ok(self.table.slack(k))
    }

    /// Current `(base, top]` of `stack`.
    pub fn bounds(&self, stack: StackId) -> Result<StackBounds, StackError> {
        let k = self.table.resolve(stack)?;
        Ok(self.table.bounds(k))
    }

    /// Values stored across all stacks.
    pub fn total_occupied(&self) -> usize {
        self.table.total_occupied()
    }

    /// Cells not held by any stack.
    pub fn free_cells(&self) -> usize {
        self.capacity().saturating_sub(self.total_occupied())
    }

    /// Usable cells, `Lend - L0`.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of stacks.
    pub fn stack_count(&self) -> usize {
        self.table.len()
    }

    /// Name of the active overflow policy.
    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Borrowed view of the current state.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot::new(&self.pool, &self.table)
    }

    /// Cumulative operation counters.
    pub fn metrics(&self) -> &AllocMetrics {
        &self.metrics
    }

    /// FNV-1a hash of all bounds and cells.
    pub fn state_hash(&self) -> u64 {
        state_hash(&self.snapshot())
    }

    /// Whether an invariant violation has disabled the allocator.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    // ── Observers ──────────────────────────────────────────────────

    /// Register `observer` under `name`.
    ///
    /// Observers are notified in registration order. Re-using a name
    /// replaces the old observer in place and returns it.
    pub fn attach_observer<O>(
        &mut self,
        name: impl Into<String>,
        observer: O,
    ) -> Option<Box<dyn PoolObserver>>
    where
        O: PoolObserver + 'static,
    {
        self.observers.insert(name.into(), Box::new(observer))
    }

    /// Unregister and return the observer named `name`.
    pub fn detach_observer(&mut self, name: &str) -> Option<Box<dyn PoolObserver>> {
        self.observers.shift_remove(name)
    }

    /// Names of registered observers, in notification order.
    pub fn observer_names(&self) -> impl Iterator<Item = &str> {
        self.observers.keys().map(String::as_str)
    }

    // ── Internal ───────────────────────────────────────────────────

    fn ensure_enabled(&self) -> Result<(), StackError> {
        if self.disabled {
            return Err(StackError::Disabled);
        }
        Ok(())
    }

    /// Check the boundary invariant, disabling the allocator on failure.
    fn verify(&mut self, when: &str) -> Result<(), StackError> {
        match self.table.check() {
            Ok(()) => Ok(()),
            Err(StackError::InvariantViolation { reason }) => {
                Err(self.fail(StackError::invariant(format!("{when}: {reason}"))))
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Record a fatal error and disable further mutation.
    fn fail(&mut self, error: StackError) -> StackError {
        tracing::error!(
            error = %error,
            policy = self.policy.name(),
            "invariant violated, allocator disabled"
        );
        self.disabled = true;
        error
    }

    fn notify(&mut self, event: PoolEvent) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = Snapshot::new(&self.pool, &self.table);
        for observer in self.observers.values_mut() {
            observer.observe(&event, &snapshot);
        }
    }
}

impl fmt::Debug for MultiStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiStack")
            .field("policy", &self.policy.name())
            .field("state", &self.snapshot())
            .field("observers", &self.observers.len())
            .field("disabled", &self.disabled)
            .finish()
    }
}
