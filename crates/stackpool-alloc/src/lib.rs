//! Shared-pool stack allocation.
//!
//! `n` sequential stacks live in one contiguous block of cells. Stack `i`
//! owns the half-open region `(base[i], top[i]]`, and the regions are kept
//! ordered with a fixed sentinel at the end of the pool. When a push finds
//! no free cell above its stack, an [`OverflowPolicy`] makes room by
//! moving other stacks.
//!
//! # Architecture
//!
//! ```text
//! MultiStack (facade)
//! ├── StoragePool: cells L0..=Lend, direction-safe shifts
//! ├── StackTable: (base, top] per stack, boundary invariant
//! ├── Box<dyn OverflowPolicy>
//! │   ├── LocalOverflowResolver: one-cell shift toward nearest slack
//! │   └── GlobalReallocator: Algorithm G
//! │       ├── GrowthTracker: tops at the last reallocation
//! │       └── ReallocationPlan: new bases + two-pass migration
//! ├── IndexMap<String, Box<dyn PoolObserver>>
//! └── AllocMetrics
//! ```
//!
//! # Overflow policies
//!
//! - **Local:** find the nearest stack above (then below) with a free cell
//!   and shift the stacks in between by one. Cheap per overflow, but a
//!   nearly full pool degrades to frequent shifting.
//! - **Growth:** redistribute all free cells, a flat share equally and the
//!   rest in proportion to how much each stack grew since the previous
//!   reallocation. Stacks that are growing get room to keep growing.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod growth;
pub mod hash;
pub mod local;
pub mod metrics;
pub mod multistack;
pub mod observer;
pub mod policy;
pub mod pool;
pub mod read;
pub mod realloc;
pub mod table;

// Public re-exports for the primary API surface.
pub use config::{ConfigError, InitialLayout, PolicyKind, PoolConfig};
pub use growth::GrowthTracker;
pub use hash::state_hash;
pub use local::LocalOverflowResolver;
pub use metrics::AllocMetrics;
pub use multistack::{MultiStack, Op, OpOutcome};
pub use observer::{ChannelObserver, Observation, PoolEvent, PoolObserver};
pub use policy::{OverflowPolicy, Resolution, ShiftDirection};
pub use pool::StoragePool;
pub use read::{OwnedSnapshot, Snapshot};
pub use realloc::{GlobalReallocator, ReallocationPlan};
pub use table::StackTable;
