mod common;

use bt_runtime::{
    AbortType, BbKey, Blackboard, Condition, Constant, ParallelMode, State, TreeBuilder,
};
use common::scripted;

#[test]
fn continuous_ticks_every_child_and_keeps_running() {
    let (a, a_script) = scripted(State::Success);
    let (b, b_script) = scripted(State::Running);
    let def = TreeBuilder::new()
        .parallel(ParallelMode::Continuous, |p| p.leaf(a).leaf(b))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();

    for _ in 0..3 {
        assert_eq!(tree.tick(&bb), State::Running);
    }
    assert_eq!(a_script.ticks(), 3);
    assert_eq!(a_script.starts(), 3, "finished children restart on the next tick");
    assert_eq!(b_script.ticks(), 3);
    assert_eq!(b_script.starts(), 1);
}

#[test]
fn until_any_failure_reports_success() {
    let def = TreeBuilder::new()
        .parallel(ParallelMode::UntilAnyFailure, |p| {
            p.leaf(Constant::running()).leaf(Constant::failure())
        })
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();

    assert_eq!(tree.tick(&Blackboard::new()), State::Success);
}

#[test]
fn until_any_success_ignores_failures() {
    let (flaky, script) = scripted(State::Failure);
    let def = TreeBuilder::new()
        .parallel(ParallelMode::UntilAnySuccess, |p| {
            p.leaf(Constant::running()).leaf(flaky)
        })
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();

    assert_eq!(tree.tick(&bb), State::Running);
    script.set(State::Success);
    assert_eq!(tree.tick(&bb), State::Success);
}

#[test]
fn until_any_complete_stops_running_siblings() {
    let (worker, script) = scripted(State::Running);
    let def = TreeBuilder::new()
        .parallel(ParallelMode::UntilAnyComplete, |p| {
            p.leaf(worker).leaf(Constant::failure())
        })
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();

    assert_eq!(tree.tick(&Blackboard::new()), State::Success);
    assert_eq!(script.ticks(), 1);
    assert_eq!(script.stops(), 1);
}

#[test]
fn simple_parallel_always_succeeds() {
    let (a, a_script) = scripted(State::Failure);
    let (b, b_script) = scripted(State::Running);
    let def = TreeBuilder::new()
        .simple_parallel(|p| p.leaf(a).leaf(b))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();

    assert_eq!(tree.tick(&Blackboard::new()), State::Success);
    assert_eq!(a_script.ticks(), 1);
    assert_eq!(b_script.ticks(), 1);
    assert_eq!(b_script.stops(), 1);
}

#[test]
fn failing_reactive_child_fails_parallel_early() {
    const ALIVE: BbKey<bool> = BbKey::new("alive");
    let (worker, script) = scripted(State::Running);
    let def = TreeBuilder::new()
        .parallel(ParallelMode::Continuous, |p| {
            p.leaf(
                Condition::new(|bb: &Blackboard| bb.get(&ALIVE).unwrap_or(false))
                    .with_abort(AbortType::LowerPriority),
            )
            .leaf(worker)
        })
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();
    bb.set(&ALIVE, true);

    assert_eq!(tree.tick(&bb), State::Running);
    bb.set(&ALIVE, false);
    assert_eq!(tree.tick(&bb), State::Failure);
    assert_eq!(script.ticks(), 1);
    assert_eq!(script.stops(), 1);
}
