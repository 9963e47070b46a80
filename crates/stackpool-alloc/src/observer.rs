//! Observation of allocator mutations.
//!
//! Observers are notified synchronously after every push and pop, whether
//! it succeeded or was rejected, and after every overflow resolution. They
//! receive the [`PoolEvent`] and a borrowed [`Snapshot`] of the state at
//! that moment. They can never mutate the allocator.
//!
//! [`ChannelObserver`] forwards owned copies to another thread, for a
//! presentation loop that renders at its own pace.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use stackpool_core::{Addr, StackError, StackId, Word};

use crate::policy::Resolution;
use crate::read::{OwnedSnapshot, Snapshot};

// ── PoolEvent ──────────────────────────────────────────────────────

/// What just happened to the pool.
#[derive(Clone, Debug, PartialEq)]
pub enum PoolEvent {
    /// `value` was written to `addr` on top of `stack`.
    Pushed {
        /// Target stack.
        stack: StackId,
        /// Address the value landed at.
        addr: Addr,
        /// The pushed value.
        value: Word,
    },
    /// `value` was removed from `addr`, the former top of `stack`.
    Popped {
        /// Source stack.
        stack: StackId,
        /// Address the value was read from.
        addr: Addr,
        /// The popped value.
        value: Word,
    },
    /// An overflow on `stack` was resolved. The snapshot shows the new
    /// layout with the pending slot reserved but not yet written.
    Resolved {
        /// The stack that overflowed.
        stack: StackId,
        /// How room was made.
        resolution: Resolution,
    },
    /// An operation on `stack` was rejected without changing the pool.
    Rejected {
        /// Target stack.
        stack: StackId,
        /// Why it was rejected: `Underflow` or `OutOfStorage`.
        error: StackError,
    },
}

impl PoolEvent {
    /// The stack the event concerns.
    pub fn stack(&self) -> StackId {
        match self {
            Self::Pushed { stack, .. }
            | Self::Popped { stack, .. }
            | Self::Resolved { stack, .. }
            | Self::Rejected { stack, .. } => *stack,
        }
    }
}

// ── PoolObserver ───────────────────────────────────────────────────

/// Receives every event together with the state it produced.
///
/// Implemented for any `FnMut(&PoolEvent, &Snapshot<'_>) + Send`, so a
/// closure can be attached directly.
pub trait PoolObserver: Send {
    /// Called once per event, in registration order across observers.
    fn observe(&mut self, event: &PoolEvent, snapshot: &Snapshot<'_>);
}

impl<F> PoolObserver for F
where
    F: FnMut(&PoolEvent, &Snapshot<'_>) + Send,
{
    fn observe(&mut self, event: &PoolEvent, snapshot: &Snapshot<'_>) {
        self(event, snapshot)
    }
}

// ── ChannelObserver ────────────────────────────────────────────────

/// An event paired with an owned copy of the resulting state.
#[derive(Clone, Debug)]
pub struct Observation {
    /// What happened.
    pub event: PoolEvent,
    /// State right after it happened.
    pub snapshot: OwnedSnapshot,
}

/// Forwards [`Observation`]s over a crossbeam channel.
///
/// Sending never blocks the mutating thread. With a bounded channel, an
/// observation that finds the channel full is dropped and counted;
/// with either kind, a disconnected receiver drops everything.
#[derive(Debug)]
pub struct ChannelObserver {
    tx: Sender<Observation>,
    dropped: Arc<AtomicU64>,
}

impl ChannelObserver {
    /// Observer backed by an unbounded channel.
    pub fn unbounded() -> (Self, Receiver<Observation>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self::from_sender(tx), rx)
    }

    /// Observer backed by a channel holding at most `cap` observations.
    pub fn bounded(cap: usize) -> (Self, Receiver<Observation>) {
        let (tx, rx) = crossbeam_channel::bounded(cap);
        (Self::from_sender(tx), rx)
    }

    fn from_sender(tx: Sender<Observation>) -> Self {
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared count of observations that could not be delivered.
    ///
    /// Clone it before attaching the observer; the count stays readable
    /// after the observer is boxed and owned by the allocator.
    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    /// Observations dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl PoolObserver for ChannelObserver {
    fn observe(&mut self, event: &PoolEvent, snapshot: &Snapshot<'_>) {
        let observation = Observation {
            event: event.clone(),
            snapshot: snapshot.to_owned(),
        };
        match self.tx.try_send(observation) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StoragePool;
    use crate::table::StackTable;
    use stackpool_core::cell::word;

    fn event(stack: usize) -> PoolEvent {
        PoolEvent::Rejected {
            stack: StackId(stack),
            error: StackError::Underflow {
                stack: StackId(stack),
            },
        }
    }

    fn accepts_observer<O: PoolObserver>(_: &O) {}

    #[test]
    fn functions_are_observers() {
        fn ignore(_: &PoolEvent, _: &Snapshot<'_>) {}
        accepts_observer(&ignore);
    }

    #[test]
    fn unbounded_channel_delivers_owned_state() {
        let mut pool = StoragePool::new(0, 2);
        let mut table = StackTable::new(0, 2, &[0]);
        table.reserve(0);
        pool.write(1, word(5).unwrap());

        let (mut obs, rx) = ChannelObserver::unbounded();
        obs.observe(&event(1), &Snapshot::new(&pool, &table));
        let got = rx.try_recv().unwrap();
        assert_eq!(got.event, event(1));
        assert_eq!(got.snapshot.cells[1], word(5));
        assert_eq!(obs.dropped(), 0);
    }

    #[test]
    fn full_bounded_channel_drops_and_counts() {
        let pool = StoragePool::new(0, 2);
        let table = StackTable::new(0, 2, &[0]);
        let (mut obs, rx) = ChannelObserver::bounded(1);
        let counter = obs.drop_counter();
        let snap = Snapshot::new(&pool, &table);
        obs.observe(&event(1), &snap);
        obs.observe(&event(1), &snap);
        obs.observe(&event(1), &snap);
        assert_eq!(counter.load(Ordering::Relaxed), 2);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn disconnected_receiver_counts_as_dropped() {
        let pool = StoragePool::new(0, 2);
        let table = StackTable::new(0, 2, &[0]);
        let (mut obs, rx) = ChannelObserver::unbounded();
        drop(rx);
        obs.observe(&event(1), &Snapshot::new(&pool, &table));
        assert_eq!(obs.dropped(), 1);
    }
}
