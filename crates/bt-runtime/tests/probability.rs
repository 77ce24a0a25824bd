mod common;

use bt_runtime::{
    tags, Blackboard, CloneOptions, Composite, Constant, ProbabilityBranch, State, TreeBuilder,
    TreeDef,
};
use bt_tools::SharedTraceLog;
use common::scripted;

fn selected(tree: &bt_runtime::Tree) -> Option<usize> {
    tree.get::<Composite<ProbabilityBranch>>(tree.root())
        .and_then(|node| node.policy().selected())
}

#[test]
fn zero_weight_branch_is_never_selected() {
    let (never, never_script) = scripted(State::Success);
    let (always, always_script) = scripted(State::Success);
    let def = TreeBuilder::new()
        .probability(vec![0, 1], |p| p.leaf(never).leaf(always))
        .build()
        .unwrap();

    for owner in 0..200u64 {
        let mut tree = def.instantiate(owner).unwrap();
        assert_eq!(tree.tick(&Blackboard::new()), State::Success);
        assert_eq!(selected(&tree), Some(1));
    }
    assert_eq!(never_script.ticks(), 0);
    assert_eq!(always_script.ticks(), 200);
}

#[test]
fn equal_weights_reach_every_branch() {
    let def = TreeBuilder::new()
        .probability(vec![1, 1], |p| p.leaf(Constant::success()).leaf(Constant::success()))
        .build()
        .unwrap();

    let mut hits = [0usize; 2];
    for owner in 0..200u64 {
        let mut tree = def.instantiate(owner).unwrap();
        tree.tick(&Blackboard::new());
        hits[selected(&tree).unwrap()] += 1;
    }
    assert!(hits[0] > 0 && hits[1] > 0, "{hits:?}");
}

#[test]
fn selection_is_reproducible_per_owner_and_seed() {
    let def = TreeBuilder::new()
        .probability(vec![1, 1, 1, 1], |p| {
            p.leaf(Constant::success())
                .leaf(Constant::success())
                .leaf(Constant::success())
                .leaf(Constant::success())
        })
        .build()
        .unwrap();

    let draws = |seed: u64| -> Vec<Option<usize>> {
        let mut tree = def
            .instantiate_with(42u64, CloneOptions::new().seed(seed))
            .unwrap();
        (0..16)
            .map(|_| {
                tree.tick(&Blackboard::new());
                let pick = selected(&tree);
                tree.stop();
                pick
            })
            .collect()
    };
    assert_eq!(draws(9), draws(9));
}

#[test]
fn all_zero_weights_fail() {
    let (child, script) = scripted(State::Success);
    let def = TreeBuilder::new()
        .probability(vec![0, 0], |p| p.leaf(child).leaf(Constant::success()))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();

    assert_eq!(tree.tick(&Blackboard::new()), State::Failure);
    assert_eq!(script.ticks(), 0);
    assert_eq!(selected(&tree), None);
}

#[test]
fn weights_follow_the_child_list() {
    let mut def = TreeDef::new();
    let branch = def.add(Composite::new(ProbabilityBranch::new(vec![5])));
    let a = def.add(Constant::success());
    let b = def.add(Constant::success());
    let c = def.add(Constant::success());
    def.set_children(branch, [a, b, c]).unwrap();

    let node = def.get::<Composite<ProbabilityBranch>>(branch).unwrap();
    assert_eq!(node.policy().weights(), &[5, 1, 1]);
}

#[test]
fn selection_is_traced() {
    let def = TreeBuilder::new()
        .probability(vec![0, 0, 3], |p| {
            p.leaf(Constant::success())
                .leaf(Constant::success())
                .leaf(Constant::success())
        })
        .build()
        .unwrap();
    let mut tree = def.instantiate(3u64).unwrap();
    let trace = SharedTraceLog::new();
    tree.set_trace_sink(trace.clone());

    tree.tick(&Blackboard::new());
    let log = trace.snapshot();
    let select: Vec<_> = log.tagged(tags::PROBABILITY_SELECT).collect();
    assert_eq!(select.len(), 1);
    assert_eq!(select[0].b, 2);
}
