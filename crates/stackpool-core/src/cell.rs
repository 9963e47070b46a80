//! Storage cell contents.
//!
//! A cell either holds a [`Word`] or is empty. Zero is reserved as the
//! empty sentinel, so occupants are `NonZeroI64` and an empty cell is
//! `None`. `Option<NonZeroI64>` has the same size as `i64`, so the pool
//! pays nothing for the distinction.

use std::num::NonZeroI64;

/// A value that can occupy a pool cell.
pub type Word = NonZeroI64;

/// One storage cell: `Some(word)` when occupied, `None` when empty.
pub type Cell = Option<Word>;

/// Convert a raw value into a storable [`Word`].
///
/// Returns `None` for `0`, the reserved empty sentinel.
pub fn word(raw: i64) -> Option<Word> {
    NonZeroI64::new(raw)
}

/// Raw representation of a cell, with `0` standing for empty.
pub fn raw(cell: Cell) -> i64 {
    cell.map_or(0, NonZeroI64::get)
}
