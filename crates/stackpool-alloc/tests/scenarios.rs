//! Scripted scenarios on the 4-stack pool over `0..=10`.
//!
//! Each test plays a fixed sequence from `stackpool_test_utils::fixtures`
//! and checks the exact layout the policy produces, plus consistency of
//! every intermediate state seen by a recording observer.

use stackpool_alloc::{
    ChannelObserver, ConfigError, MultiStack, Op, OpOutcome, PoolConfig, PoolEvent, PolicyKind, Resolution,
};
use stackpool_core::{PoolView, StackError, StackId};
use stackpool_test_utils::fixtures::{growth_walkthrough, local_walkthrough, opening};
use stackpool_test_utils::{assert_consistent, stack_values, RecordingObserver};

// ── Helpers ─────────────────────────────────────────────────────

fn knuth(policy: PolicyKind) -> (MultiStack, RecordingObserver) {
    let mut stacks = MultiStack::new(PoolConfig::new(0, 10, 4).policy(policy)).unwrap();
    let recorder = RecordingObserver::new();
    stacks.attach_observer("recorder", recorder.clone());
    (stacks, recorder)
}

fn run(stacks: &mut MultiStack, ops: &[Op]) -> Vec<Result<OpOutcome, StackError>> {
    ops.iter().map(|&op| stacks.apply(op)).collect()
}

fn layout(stacks: &MultiStack) -> (Vec<usize>, Vec<usize>) {
    (1..=stacks.stack_count())
        .map(|i| {
            let b = stacks.bounds(StackId(i)).unwrap();
            (b.base, b.top)
        })
        .unzip()
}

fn cells(stacks: &MultiStack) -> Vec<i64> {
    let snap = stacks.snapshot();
    (snap.origin() + 1..=snap.limit())
        .map(|a| snap.cell(a).flatten().map_or(0, |w| w.get()))
        .collect()
}

fn assert_every_observation_consistent(recorder: &RecordingObserver) {
    for obs in recorder.observations().iter() {
        if matches!(obs.event, PoolEvent::Resolved { .. }) {
            // Mid-push state: the pending slot is reserved but empty.
            continue;
        }
        assert_consistent(&obs.snapshot);
    }
}

// ── Local policy ────────────────────────────────────────────────

#[test]
fn local_opening_sequence() {
    let (mut s, _) = knuth(PolicyKind::Local);
    let results = run(&mut s, &opening());
    assert!(results.iter().all(Result::is_ok));
    let occupancies: Vec<usize> = (1..=4).map(|i| s.occupancy(StackId(i)).unwrap()).collect();
    assert_eq!(occupancies, vec![2, 1, 0, 1]);
    assert_eq!(&cells(&s)[..2], &[11, 12]);
}

#[test]
fn local_walkthrough_fills_pool_with_both_shift_directions() {
    let (mut s, recorder) = knuth(PolicyKind::Local);
    let results = run(&mut s, &local_walkthrough());
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(layout(&s), (vec![0, 2, 3, 4], vec![2, 3, 4, 10]));
    assert_eq!(cells(&s), vec![11, 13, 21, 31, 41, 42, 43, 44, 45, 46]);
    assert_eq!(s.free_cells(), 0);

    let m = s.metrics();
    assert_eq!(m.overflows, 8);
    assert_eq!(m.forward_shifts, 6);
    assert_eq!(m.backward_shifts, 2);
    assert_eq!(m.cells_moved, 19);
    assert_eq!(m.pushes, 13);
    assert_eq!(m.pops, 3);

    assert_every_observation_consistent(&recorder);
}

#[test]
fn backward_shift_skips_the_pending_slot() {
    let (mut s, recorder) = knuth(PolicyKind::Local);
    let ops = local_walkthrough();
    // Stop just before the first backward shift.
    run(&mut s, &ops[..14]);
    s.push(StackId(4), 45).unwrap();

    let shifts: Vec<Resolution> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            PoolEvent::Resolved { resolution, .. } => Some(resolution),
            _ => None,
        })
        .collect();
    let Some(Resolution::Shifted {
        first,
        last,
        cells_moved,
        ..
    }) = shifts.last()
    else {
        panic!("expected a shift");
    };
    assert_eq!((*first, *last), (StackId(3), StackId(4)));
    // 31 and 41..44 moved; the slot 45 lands in was never copied.
    assert_eq!(*cells_moved, 5);
    assert_eq!(stack_values(&s.snapshot())[3], vec![41, 42, 43, 44, 45]);
}

// ── Growth policy ───────────────────────────────────────────────

#[test]
fn growth_opening_sequence() {
    let (mut s, _) = knuth(PolicyKind::Growth);
    let results = run(&mut s, &opening());
    assert_eq!(
        results,
        vec![
            Ok(OpOutcome::Pushed(1)),
            Ok(OpOutcome::Pushed(2)),
            Ok(OpOutcome::Pushed(10)),
            Ok(OpOutcome::Pushed(4)),
        ]
    );
    assert_eq!(layout(&s), (vec![0, 3, 6, 7], vec![2, 4, 6, 8]));
    assert_eq!(s.metrics().reallocations, 2);
}

#[test]
fn repeated_pushes_reallocate_by_recent_growth() {
    let (mut s, recorder) = knuth(PolicyKind::Growth);
    run(&mut s, &opening());
    let before = recorder.len();

    let mut value = 13;
    let rejected = loop {
        match s.push(StackId(1), value) {
            Ok(_) => value += 1,
            Err(e) => break e,
        }
    };
    assert_eq!(rejected, StackError::OutOfStorage { stack: StackId(1) });
    assert_eq!(value, 19);

    let observations = recorder.observations();
    let mut prev_total = s.total_occupied();
    let mut plans = Vec::new();
    for obs in &observations[before..] {
        match &obs.event {
            PoolEvent::Resolved {
                resolution: Resolution::Reallocated { plan, .. },
                ..
            } => {
                assert!(plan.new_bases.windows(2).all(|w| w[0] <= w[1]));
                plans.push(plan.clone());
            }
            PoolEvent::Pushed { .. } => {
                assert_consistent(&obs.snapshot);
                prev_total = obs.snapshot.total_occupied();
            }
            _ => {}
        }
    }
    assert_eq!(prev_total, 10);

    // Growth counts only what happened since the previous reallocation,
    // including the pending push.
    let growth: Vec<usize> = plans.iter().map(|p| p.growth).collect();
    assert_eq!(growth, vec![2, 4]);
    assert_eq!(plans[0].new_bases.as_slice(), &[0, 7, 8, 8]);
    assert_eq!(plans[1].free, 0);
    assert_eq!(plans[1].beta, 0.0);

    assert_eq!(
        stack_values(&s.snapshot()),
        vec![
            vec![11, 12, 13, 14, 15, 16, 17, 18],
            vec![21],
            vec![],
            vec![41]
        ]
    );
}

#[test]
fn growth_walkthrough_keeps_every_value() {
    let (mut s, recorder) = knuth(PolicyKind::Growth);
    let results = run(&mut s, &growth_walkthrough());
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(layout(&s), (vec![0, 1, 7, 8], vec![1, 2, 8, 9]));
    assert_eq!(
        stack_values(&s.snapshot()),
        vec![vec![11], vec![21], vec![31], vec![41]]
    );
    assert_eq!(s.metrics().reallocations, 11);
    assert_eq!(s.metrics().cells_moved, 19);
    assert_every_observation_consistent(&recorder);
}

#[test]
fn policies_agree_on_contents() {
    for ops in [local_walkthrough(), growth_walkthrough()] {
        let (mut local, _) = knuth(PolicyKind::Local);
        let (mut growth, _) = knuth(PolicyKind::Growth);
        run(&mut local, &ops);
        run(&mut growth, &ops);
        assert_eq!(
            stack_values(&local.snapshot()),
            stack_values(&growth.snapshot())
        );
    }
}

// ── Rejections ──────────────────────────────────────────────────

#[test]
fn full_pool_rejects_without_change() {
    for policy in [PolicyKind::Local, PolicyKind::Growth] {
        let (mut s, recorder) = knuth(policy);
        run(&mut s, &local_walkthrough());
        assert_eq!(s.free_cells(), 0);

        let hash = s.state_hash();
        for i in 1..=4 {
            assert_eq!(
                s.push(StackId(i), 99),
                Err(StackError::OutOfStorage { stack: StackId(i) })
            );
        }
        assert_eq!(s.state_hash(), hash);
        assert_eq!(s.metrics().out_of_storage, 4);
        assert!(matches!(
            recorder.events().last(),
            Some(PoolEvent::Rejected {
                error: StackError::OutOfStorage { .. },
                ..
            })
        ));
    }
}

#[test]
fn pool_at_top_of_address_space_rejects_cleanly() {
    assert!(matches!(
        MultiStack::new(PoolConfig::new(usize::MAX - 2, usize::MAX, 1)),
        Err(ConfigError::AddressOverflow { .. })
    ));

    for policy in [PolicyKind::Local, PolicyKind::Growth] {
        let config = PoolConfig::new(usize::MAX - 3, usize::MAX - 1, 1).policy(policy);
        let mut s = MultiStack::new(config).unwrap();
        s.push(StackId(1), 1).unwrap();
        s.push(StackId(1), 2).unwrap();
        assert_eq!(
            s.push(StackId(1), 3),
            Err(StackError::OutOfStorage { stack: StackId(1) })
        );
        let values: Vec<i64> = s.contents(StackId(1)).unwrap().iter().map(|w| w.get()).collect();
        assert_eq!(values, vec![1, 2]);
        assert!(!s.is_disabled());
    }
}

#[test]
fn underflow_leaves_bounds_alone() {
    let (mut s, _) = knuth(PolicyKind::Local);
    run(&mut s, &opening());
    let before = layout(&s);
    assert_eq!(
        s.pop(StackId(3)),
        Err(StackError::Underflow { stack: StackId(3) })
    );
    assert_eq!(layout(&s), before);
}

// ── Observation across threads ──────────────────────────────────

#[test]
fn channel_observer_feeds_another_thread() {
    let mut s = MultiStack::new(PoolConfig::new(0, 10, 4)).unwrap();
    let (observer, rx) = ChannelObserver::unbounded();
    let dropped = observer.drop_counter();
    s.attach_observer("channel", observer);

    let consumer = std::thread::spawn(move || {
        rx.iter()
            .filter(|o| matches!(o.event, PoolEvent::Pushed { .. }))
            .map(|o| o.snapshot.total_occupied())
            .collect::<Vec<_>>()
    });

    run(&mut s, &opening());
    drop(s);

    let totals = consumer.join().unwrap();
    assert_eq!(totals, vec![1, 2, 3, 4]);
    assert_eq!(dropped.load(std::sync::atomic::Ordering::Relaxed), 0);
}
