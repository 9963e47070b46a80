//! Stack identifiers and the [`Addr`] type alias.

use std::fmt;

/// An address in the shared storage pool.
///
/// Addresses are absolute: a pool configured for `L0..=Lend` hands out
/// addresses in that range, not offsets from zero.
pub type Addr = usize;

/// Identifies one of the `n` stacks sharing a pool.
///
/// Stack ids are 1-based, matching the conventional `Stack[1]..Stack[n]`
/// numbering. `StackId(0)` is representable but never valid; operations
/// given an id outside `1..=n` fail with
/// [`StackError::InvalidIndex`](crate::StackError::InvalidIndex).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackId(pub usize);

impl StackId {
    /// The id of the stack stored at 0-based table position `index`.
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// 0-based table position of this stack, or `None` for `StackId(0)`.
    pub fn index(self) -> Option<usize> {
        self.0.checked_sub(1)
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for StackId {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_one_less_than_id() {
        assert_eq!(StackId(1).index(), Some(0));
        assert_eq!(StackId(4).index(), Some(3));
    }

    #[test]
    fn zero_has_no_index() {
        assert_eq!(StackId(0).index(), None);
    }

    #[test]
    fn from_index_inverts_index() {
        for i in 0..16 {
            assert_eq!(StackId::from_index(i).index(), Some(i));
        }
    }

    #[test]
    fn display_shows_one_based_number() {
        assert_eq!(StackId(3).to_string(), "3");
    }
}
