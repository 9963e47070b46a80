//! Stackpool: `n` sequential stacks sharing one contiguous storage pool.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the stackpool sub-crates. For most users, adding `stackpool` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use stackpool::prelude::*;
//!
//! // Four stacks over addresses 0..=10, resolving overflow with Algorithm G.
//! let config = PoolConfig::new(0, 10, 4).policy(PolicyKind::Growth);
//! let mut stacks = MultiStack::new(config).unwrap();
//!
//! stacks.push(StackId(4), 41).unwrap();
//! stacks.push(StackId(1), 11).unwrap(); // overflows, reallocates
//! assert_eq!(stacks.metrics().reallocations, 1);
//!
//! assert_eq!(stacks.pop(StackId(4)).unwrap().get(), 41);
//! assert_eq!(
//!     stacks.pop(StackId(4)),
//!     Err(StackError::Underflow { stack: StackId(4) })
//! );
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `stackpool-core` | `StackId`, cell values, `StackError`, `PoolView` |
//! | [`alloc`] | `stackpool-alloc` | `MultiStack`, policies, snapshots, observers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`stackpool-core`).
///
/// Contains stack ids, the cell value type, the error taxonomy, and the
/// read-only [`types::PoolView`] trait.
pub use stackpool_core as types;

/// The allocator and its overflow policies (`stackpool-alloc`).
///
/// [`alloc::MultiStack`] is the entry point; [`alloc::OverflowPolicy`]
/// is the extension point for custom strategies.
pub use stackpool_alloc as alloc;

/// Common imports for typical stackpool usage.
///
/// ```rust
/// use stackpool::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use stackpool_core::{Addr, Cell, PoolView, StackBounds, StackError, StackId, Word};

    // Allocator and configuration
    pub use stackpool_alloc::{
        AllocMetrics, ConfigError, InitialLayout, MultiStack, Op, OpOutcome, PolicyKind,
        PoolConfig,
    };

    // Policies
    pub use stackpool_alloc::{
        GlobalReallocator, LocalOverflowResolver, OverflowPolicy, Resolution, ShiftDirection,
    };

    // Observation
    pub use stackpool_alloc::{
        ChannelObserver, Observation, OwnedSnapshot, PoolEvent, PoolObserver, Snapshot,
    };
}
