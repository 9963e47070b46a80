//! Hashing of pool state for determinism checks.
//!
//! Uses FNV-1a for fast, deterministic hashing. These hashes are not
//! cryptographically secure; they exist so two runs of the same operation
//! sequence can be compared with a single `u64`.

use stackpool_core::cell::raw;
use stackpool_core::{PoolView, StackId};

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Hash the address range, every stack's bounds, and every cell.
///
/// Two views hash equal exactly when their bounds and cell contents are
/// identical (barring collisions). Empty cells hash as `0`.
pub fn state_hash(view: &dyn PoolView) -> u64 {
    let mut hash = FNV_OFFSET;
    hash = fnv1a_u64(hash, view.origin() as u64);
    hash = fnv1a_u64(hash, view.limit() as u64);
    hash = fnv1a_u64(hash, view.stack_count() as u64);

    for i in 0..view.stack_count() {
        if let Some(b) = view.bounds(StackId::from_index(i)) {
            hash = fnv1a_u64(hash, b.base as u64);
            hash = fnv1a_u64(hash, b.top as u64);
        }
    }
    for addr in view.origin()..=view.limit() {
        let v = view.cell(addr).map_or(0, raw);
        hash = fnv1a_u64(hash, v as u64);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::OwnedSnapshot;
    use stackpool_core::cell::word;
    use stackpool_core::StackBounds;

    fn snapshot(cells: &[i64], bounds: &[(usize, usize)]) -> OwnedSnapshot {
        OwnedSnapshot {
            origin: 0,
            cells: cells.iter().map(|&v| word(v)).collect(),
            stacks: bounds
                .iter()
                .enumerate()
                .map(|(i, &(base, top))| StackBounds {
                    stack: StackId::from_index(i),
                    base,
                    top,
                })
                .collect(),
        }
    }

    #[test]
    fn same_state_same_hash() {
        let a = snapshot(&[0, 11, 12, 0], &[(0, 2), (2, 2)]);
        let b = snapshot(&[0, 11, 12, 0], &[(0, 2), (2, 2)]);
        assert_eq!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn cell_contents_matter() {
        let a = snapshot(&[0, 11, 12, 0], &[(0, 2), (2, 2)]);
        let b = snapshot(&[0, 11, 13, 0], &[(0, 2), (2, 2)]);
        assert_ne!(state_hash(&a), state_hash(&b));
    }

    #[test]
    fn bounds_matter() {
        let a = snapshot(&[0, 11, 0, 0], &[(0, 1), (1, 1)]);
        let b = snapshot(&[0, 11, 0, 0], &[(0, 1), (3, 3)]);
        assert_ne!(state_hash(&a), state_hash(&b));
    }
}
