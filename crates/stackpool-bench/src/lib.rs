//! Benchmark profiles and workloads for stackpool.
//!
//! Provides pre-built [`PoolConfig`] profiles and deterministic operation
//! streams:
//!
//! - [`reference_profile`]: 16 stacks over 4096 cells
//! - [`stress_profile`]: 64 stacks over 65536 cells
//! - [`uniform_workload`]: pushes and pops spread evenly across stacks
//! - [`skewed_workload`]: most pushes land on a few hot stacks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackpool_alloc::{Op, PolicyKind, PoolConfig};
use stackpool_core::StackId;

/// Reference profile: 16 stacks sharing addresses `0..=4096`.
pub fn reference_profile(policy: PolicyKind) -> PoolConfig {
    PoolConfig::new(0, 4096, 16).policy(policy)
}

/// Stress profile: 64 stacks sharing addresses `0..=65536`.
pub fn stress_profile(policy: PolicyKind) -> PoolConfig {
    PoolConfig::new(0, 65_536, 64).policy(policy)
}

/// `len` operations spread evenly over `stacks` stacks.
///
/// Pushes outnumber pops 3:2, so the pool slowly fills and overflows
/// become more frequent as the run goes on.
pub fn uniform_workload(seed: u64, stacks: usize, len: usize) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (1..=len as i64)
        .map(|v| {
            let stack = StackId(rng.random_range(1..=stacks));
            if rng.random_bool(0.6) {
                Op::Push(stack, v)
            } else {
                Op::Pop(stack)
            }
        })
        .collect()
}

/// `len` operations where `hot` stacks receive 90% of the pushes and
/// pops are spread evenly.
///
/// The access pattern Algorithm G is designed for: growth concentrates
/// in a few stacks, so giving them extra room pays off.
pub fn skewed_workload(seed: u64, stacks: usize, hot: usize, len: usize) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let hot = hot.clamp(1, stacks);
    (1..=len as i64)
        .map(|v| {
            if rng.random_bool(0.6) {
                let stack = if rng.random_bool(0.9) {
                    rng.random_range(1..=hot)
                } else {
                    rng.random_range(1..=stacks)
                };
                Op::Push(StackId(stack), v)
            } else {
                Op::Pop(StackId(rng.random_range(1..=stacks)))
            }
        })
        .collect()
}
