//! Plays the TAOCP 2.2.2 walkthroughs and prints the pool after each step.
//!
//! A renderer thread receives owned snapshots over a channel, the way a
//! visualiser would. Allocator events go to the log:
//!
//! ```text
//! cargo run -p stackpool --example knuth_demo -- growth
//! RUST_LOG=stackpool_alloc=trace cargo run -p stackpool --example knuth_demo
//! ```

use std::thread;

use stackpool::prelude::*;
use tracing_subscriber::EnvFilter;

fn push(stack: usize, value: i64) -> Op {
    Op::Push(StackId(stack), value)
}

fn pop(stack: usize) -> Op {
    Op::Pop(StackId(stack))
}

/// Mixed pushes and pops that end with the pool full.
fn walkthrough() -> Vec<Op> {
    vec![
        push(1, 11),
        push(1, 12),
        push(4, 41),
        push(2, 21),
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
        push(2, 23),
    ]
}

fn describe(event: &PoolEvent) -> String {
    match event {
        PoolEvent::Pushed { stack, addr, value } => format!("push({stack}, {value}) -> @{addr}"),
        PoolEvent::Popped { stack, value, .. } => format!("pop({stack}) -> {value}"),
        PoolEvent::Resolved { stack, resolution } => match resolution {
            Resolution::Shifted {
                direction,
                first,
                last,
                cells_moved,
            } => format!(
                "  overflow on {stack}: shifted {first}..={last} {direction:?}, {cells_moved} cells"
            ),
            Resolution::Reallocated { plan, cells_moved } => format!(
                "  overflow on {stack}: new bases {:?}, {cells_moved} cells",
                plan.new_bases.as_slice()
            ),
            Resolution::Unsolved => format!("  overflow on {stack}: unsolved"),
        },
        PoolEvent::Rejected { error, .. } => format!("rejected: {error}"),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stackpool_alloc=info")),
        )
        .init();

    let policy = match std::env::args().nth(1).as_deref() {
        Some("growth") => PolicyKind::Growth,
        _ => PolicyKind::Local,
    };
    let config = PoolConfig::new(0, 10, 4).policy(policy);
    let mut stacks = match MultiStack::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let (observer, rx) = ChannelObserver::unbounded();
    stacks.attach_observer("renderer", observer);
    let renderer = thread::spawn(move || {
        for obs in rx {
            println!("{:<48} {}", describe(&obs.event), obs.snapshot);
        }
    });

    for op in walkthrough() {
        // Rejections are already reported through the observer.
        let _ = stacks.apply(op);
    }

    let metrics = stacks.metrics().clone();
    let policy_name = stacks.policy_name().to_owned();
    drop(stacks);
    if renderer.join().is_err() {
        eprintln!("renderer thread panicked");
    }

    println!();
    println!("policy:          {policy_name}");
    println!("pushes / pops:   {} / {}", metrics.pushes, metrics.pops);
    println!("overflows:       {}", metrics.overflows);
    println!(
        "  shifts:        {} forward, {} backward",
        metrics.forward_shifts, metrics.backward_shifts
    );
    println!("  reallocations: {}", metrics.reallocations);
    println!("  out of storage: {}", metrics.out_of_storage);
    println!("cells moved:     {}", metrics.cells_moved);
}
