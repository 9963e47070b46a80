//! Core types and traits for stackpool.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the rest of the workspace: stack identifiers,
//! the cell value type, the error taxonomy, and the read-only
//! [`PoolView`] trait that snapshots and observers are written against.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod error;
pub mod id;
pub mod traits;

pub use cell::{Cell, Word};
pub use error::StackError;
pub use id::{Addr, StackId};
pub use traits::{PoolView, StackBounds};
