//! Error types for stack operations.
//!
//! Ordinary outcomes (`InvalidIndex`, `InvalidValue`, `Underflow`,
//! `OutOfStorage`) leave the pool untouched and are the caller's to
//! handle. `InvariantViolation` and `Disabled` are fatal: they indicate
//! an implementation bug and the allocator refuses further mutation.

use std::error::Error;
use std::fmt;

use crate::id::StackId;

/// Errors returned by push, pop, and overflow resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackError {
    /// Stack id outside `1..=stack_count`.
    InvalidIndex {
        /// The offending id.
        stack: StackId,
        /// Number of stacks in the pool.
        stack_count: usize,
    },
    /// Attempted to store the reserved empty sentinel (`0`).
    InvalidValue,
    /// `pop` on an empty stack.
    Underflow {
        /// The empty stack.
        stack: StackId,
    },
    /// The overflow policy could not find room for a push.
    OutOfStorage {
        /// The stack whose push was rejected.
        stack: StackId,
    },
    /// Boundary ordering was broken or the free-cell count went negative.
    InvariantViolation {
        /// Which check failed.
        reason: String,
    },
    /// A previous invariant violation disabled the allocator.
    Disabled,
}

impl StackError {
    /// Whether this error indicates an implementation fault rather than
    /// an ordinary, recoverable outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. } | Self::Disabled)
    }

    /// Shorthand for building an [`InvariantViolation`](Self::InvariantViolation).
    pub fn invariant(reason: impl Into<String>) -> Self {
        Self::InvariantViolation {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex { stack, stack_count } => {
                write!(f, "stack {stack} out of range 1..={stack_count}")
            }
            Self::InvalidValue => write!(f, "0 is reserved for empty cells"),
            Self::Underflow { stack } => write!(f, "stack {stack} underflow"),
            Self::OutOfStorage { stack } => {
                write!(f, "no room left to push onto stack {stack}")
            }
            Self::InvariantViolation { reason } => {
                write!(f, "invariant violation: {reason}")
            }
            Self::Disabled => write!(f, "allocator disabled after an invariant violation"),
        }
    }
}

impl Error for StackError {}
