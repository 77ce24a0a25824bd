mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bt_runtime::{
    tags, Blackboard, Constant, Node, NodeCore, NodeExt, State, TickCx, TreeBuilder,
};
use bt_tools::SharedTraceLog;
use common::scripted;

#[test]
fn initialize_runs_once_per_node_lifetime() {
    let (child, script) = scripted(State::Success);
    let def = TreeBuilder::new()
        .repeat(bt_runtime::RepeatMode::times(3), |r| r.leaf(child))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();

    while tree.tick(&bb).is_running() {}
    assert_eq!(script.inits(), 1);
    assert_eq!(script.starts(), 3);
    assert_eq!(script.stops(), 3);
}

#[test]
fn terminal_state_is_kept_until_parent_restarts() {
    let (a, _) = scripted(State::Success);
    let (b, _) = scripted(State::Running);
    let def = TreeBuilder::new()
        .sequencer(|s| s.leaf(a.named("a")).leaf(b.named("b")))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();
    let a = tree.find("a").unwrap();
    let b = tree.find("b").unwrap();

    tree.tick(&bb);
    assert_eq!(tree.state_of(a), Some(State::Success));
    assert!(!tree.node(a).unwrap().core().started());
    assert_eq!(tree.state_of(b), Some(State::NotEntered));

    tree.tick(&bb);
    assert_eq!(tree.state_of(a), Some(State::Success));
    assert_eq!(tree.state_of(b), Some(State::Running));
    assert!(tree.node(b).unwrap().core().started());
}

#[test]
fn abort_only_stops_started_nodes() {
    let (a, a_script) = scripted(State::Success);
    let (b, b_script) = scripted(State::Running);
    let def = TreeBuilder::new()
        .sequencer(|s| s.leaf(a).leaf(b))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();

    tree.tick(&bb);
    tree.tick(&bb);
    tree.stop();

    assert_eq!(a_script.stops(), 1, "stopped once when it finished");
    assert_eq!(b_script.stops(), 1, "stopped once by the abort");
    for id in tree.ids() {
        let core = tree.node(id).unwrap().core();
        assert_eq!(core.state(), State::NotEntered);
        assert!(!core.started());
    }
}

#[test]
fn evaluation_never_starts_a_node() {
    let (low, _) = scripted(State::Running);
    let def = TreeBuilder::new()
        .selector(|s| {
            s.leaf(
                bt_runtime::Condition::new(|_: &Blackboard| false)
                    .with_abort(bt_runtime::AbortType::LowerPriority)
                    .named("guard"),
            )
            .leaf(low)
        })
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let bb = Blackboard::new();
    let guard = tree.find("guard").unwrap();

    for _ in 0..4 {
        tree.tick(&bb);
        assert!(!tree.node(guard).unwrap().core().started());
    }
}

#[test]
fn not_entered_from_a_leaf_is_treated_as_failure() {
    let def = TreeBuilder::new()
        .leaf(Constant::new(State::NotEntered))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();

    assert_eq!(tree.tick(&Blackboard::new()), State::Failure);
}

#[test]
fn start_and_stop_are_traced() {
    let def = TreeBuilder::new()
        .sequencer(|s| s.leaf(Constant::success()).leaf(Constant::success()))
        .build()
        .unwrap();
    let mut tree = def.instantiate(1u64).unwrap();
    let trace = SharedTraceLog::new();
    tree.set_trace_sink(trace.clone());
    let bb = Blackboard::new();

    tree.tick(&bb);
    tree.tick(&bb);

    let log = trace.snapshot();
    assert_eq!(log.count(tags::NODE_START), 3);
    assert_eq!(log.count(tags::NODE_STOP), 3);
    let root_stop = log
        .tagged(tags::NODE_STOP)
        .find(|event| event.a == 0)
        .unwrap();
    assert_eq!(root_stop.tick, 2);
    assert_eq!(root_stop.b, State::Success.code());
}

#[derive(Debug, Clone)]
struct Awake {
    core: NodeCore,
    awakened: Arc<AtomicUsize>,
}

impl Node for Awake {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_awake(&mut self) {
        self.awakened.fetch_add(1, Ordering::SeqCst);
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) -> State {
        State::Success
    }
}

#[test]
fn awake_is_broadcast_once_per_clone() {
    let awakened = Arc::new(AtomicUsize::new(0));
    let node = Awake {
        core: NodeCore::new(),
        awakened: Arc::clone(&awakened),
    };
    let def = TreeBuilder::new()
        .sequencer(|s| s.leaf(node.clone()).leaf(node))
        .build()
        .unwrap();

    let _first = def.instantiate(1u64).unwrap();
    let _second = def.instantiate(2u64).unwrap();
    assert_eq!(awakened.load(Ordering::SeqCst), 4);
}
