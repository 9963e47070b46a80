//! Scripted scenarios and seeded random workloads.
//!
//! - [`local_walkthrough`]: the mixed push/pop sequence from TAOCP p. 247,
//!   which exercises both local shift directions on the default pool.
//! - [`growth_walkthrough`]: the alternating sequence from p. 248 that
//!   drives Algorithm G through repeated reallocations.
//! - [`random_ops`]: reproducible random workloads from a `ChaCha8Rng`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stackpool_alloc::Op;
use stackpool_core::StackId;

fn push(stack: usize, value: i64) -> Op {
    Op::Push(StackId(stack), value)
}

fn pop(stack: usize) -> Op {
    Op::Pop(StackId(stack))
}

/// The four-push opening shared by both walkthroughs.
///
/// On a packed 4-stack pool over `0..=10` it leaves occupancies
/// `[2, 1, 0, 1]` with `11, 12` at addresses 1 and 2.
pub fn opening() -> Vec<Op> {
    vec![push(1, 11), push(1, 12), push(4, 41), push(2, 21)]
}

/// Sixteen operations on four stacks; never more than eight values live.
pub fn local_walkthrough() -> Vec<Op> {
    let mut ops = opening();
    ops.extend([
        pop(1),
        push(3, 31),
        push(1, 13),
        push(1, 14),
        push(2, 22),
        push(4, 42),
        pop(2),
        pop(1),
        push(4, 43),
        push(4, 44),
        push(4, 45),
        push(4, 46),
    ]);
    ops
}

/// Stacks 1 and 3 alternately grow and shrink after the opening.
pub fn growth_walkthrough() -> Vec<Op> {
    let mut ops = opening();
    ops.extend([pop(1), push(3, 31), push(1, 13), pop(1)]);
    for round in 0..4 {
        ops.extend([
            push(3, 32 + round),
            pop(3),
            push(1, 14 + round),
            pop(1),
        ]);
    }
    ops.extend([push(2, 22), pop(2)]);
    ops
}

/// Push `count` values onto one stack.
pub fn fill(stack: usize, count: usize) -> Vec<Op> {
    (1..=count as i64)
        .map(|v| push(stack, stack as i64 * 1000 + v))
        .collect()
}

/// `len` random operations over `stacks` stacks.
///
/// Each step pushes with probability `push_bias`, otherwise pops. Pushed
/// values are unique and never zero, so every value can be traced through
/// shifts and reallocations.
pub fn random_ops(rng: &mut impl Rng, stacks: usize, len: usize, push_bias: f64) -> Vec<Op> {
    let mut next = 0i64;
    (0..len)
        .map(|_| {
            let stack = rng.random_range(1..=stacks);
            if rng.random_bool(push_bias) {
                next += 1;
                push(stack, next)
            } else {
                pop(stack)
            }
        })
        .collect()
}

/// [`random_ops`] from a fixed seed.
pub fn seeded_ops(seed: u64, stacks: usize, len: usize, push_bias: f64) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_ops(&mut rng, stacks, len, push_bias)
}
