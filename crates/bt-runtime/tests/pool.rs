mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bt_runtime::{
    Blackboard, CloneOptions, Composite, Constant, Node, NodeCore, NodeKind, NodePool, PoolConfig,
    Sequencer, SharedNodePool, State, TickCx, TreeBuilder, TreeDef, Wait,
};

fn failing_tree() -> TreeDef {
    TreeBuilder::new()
        .sequencer(|s| s.leaf(Constant::failure()))
        .build()
        .unwrap()
}

#[test]
fn released_nodes_come_back_clean() {
    let def = failing_tree();
    let mut pool = NodePool::new();

    let mut tree = def
        .instantiate_with(1u64, CloneOptions::new().pool(&mut pool))
        .unwrap();
    assert_eq!(tree.tick(&Blackboard::new()), State::Failure);
    let leaf = tree.children(tree.root())[0].unwrap();
    assert_eq!(tree.state_of(leaf), Some(State::Failure));
    assert_eq!(tree.recycle(&mut pool), 2);
    assert_eq!(pool.available::<Constant>(), 1);

    let tree = def
        .instantiate_with(2u64, CloneOptions::new().pool(&mut pool))
        .unwrap();
    let core = tree.node(leaf).unwrap().core();
    assert_eq!(core.state(), State::NotEntered);
    assert!(!core.started());
    assert!(!core.initialized());
    assert_eq!(tree.state(), State::NotEntered);

    let stats = pool.stats_of::<Constant>();
    assert_eq!(stats.created, 1);
    assert_eq!(stats.reused, 1);
    assert_eq!(stats.returned, 1);
    assert_eq!(pool.stats_of::<Composite<Sequencer>>().reused, 1);
    assert_eq!(pool.total().reused, 2);
    assert!((pool.total().reuse_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn each_acquire_counts_one_reuse() {
    let template = Wait::new(3);
    let mut pool = NodePool::new();

    let first = pool.acquire(&template);
    let second = pool.acquire(&template);
    pool.release(first);
    pool.release(second);

    let _a = pool.acquire(&template);
    assert_eq!(pool.stats_of::<Wait>().reused, 1);
    let _b = pool.acquire(&template);
    assert_eq!(pool.stats_of::<Wait>().reused, 2);
    let _c = pool.acquire(&template);
    let stats = pool.stats_of::<Wait>();
    assert_eq!((stats.created, stats.reused), (3, 2));
}

#[test]
fn acquired_node_takes_the_template_settings() {
    let mut pool = NodePool::new();
    pool.release(Box::new(Wait::new(10)));

    let node = pool.acquire(&Wait::new(2));
    let wait = node.as_any().downcast_ref::<Wait>().unwrap();
    assert_eq!(wait.ticks(), 2);
    assert_eq!(pool.stats_of::<Wait>().reused, 1);
}

#[test]
fn full_pool_discards_releases() {
    let mut pool = NodePool::new();
    pool.set_capacity::<Constant>(1);

    assert!(pool.release(Box::new(Constant::success())));
    assert!(!pool.release(Box::new(Constant::success())));
    let stats = pool.stats_of::<Constant>();
    assert_eq!((stats.returned, stats.discarded), (1, 1));
    assert_eq!(pool.available::<Constant>(), 1);
}

#[test]
fn capacities_default_by_node_family() {
    let pool = NodePool::with_config(PoolConfig {
        leaf_capacity: 4,
        ..PoolConfig::default()
    });
    assert_eq!(pool.capacity_of::<Constant>(NodeKind::Leaf), 4);
    assert_eq!(pool.capacity_of::<Composite<Sequencer>>(NodeKind::Composite), 16);

    let mut pool = pool;
    for _ in 0..10 {
        pool.release(Box::new(Constant::success()));
    }
    assert_eq!(pool.available::<Constant>(), 4);
}

#[derive(Debug, Clone)]
struct Resettable {
    core: NodeCore,
    resets: Arc<AtomicUsize>,
}

impl Node for Resettable {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) -> State {
        State::Success
    }

    fn on_reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn reset_hook_runs_before_reuse() {
    let resets = Arc::new(AtomicUsize::new(0));
    let template = Resettable {
        core: NodeCore::new(),
        resets: Arc::clone(&resets),
    };
    let mut pool = NodePool::new();

    let node = pool.acquire(&template);
    let after_create = resets.load(Ordering::SeqCst);
    pool.release(node);
    let _node = pool.acquire(&template);

    assert!(resets.load(Ordering::SeqCst) > after_create);
}

#[test]
fn clear_drops_pooled_instances_but_keeps_counters() {
    let mut pool = NodePool::new();
    pool.release(Box::new(Constant::success()));
    pool.clear();

    assert_eq!(pool.available::<Constant>(), 0);
    assert_eq!(pool.stats_of::<Constant>().returned, 1);
}

#[test]
fn shared_pool_serves_several_threads() {
    let pool = SharedNodePool::new(PoolConfig::default());
    let def = Arc::new(failing_tree());

    let handles: Vec<_> = (0..4u64)
        .map(|owner| {
            let pool = pool.clone();
            let def = Arc::clone(&def);
            std::thread::spawn(move || {
                for round in 0..10u64 {
                    let mut tree = pool
                        .with(|p| {
                            def.instantiate_with(owner * 100 + round, CloneOptions::new().pool(p))
                        })
                        .unwrap();
                    assert_eq!(tree.tick(&Blackboard::new()), State::Failure);
                    pool.with(|p| tree.recycle(p));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = pool.total();
    assert_eq!(total.created + total.reused, 4 * 10 * 2);
    assert_eq!(total.returned, 4 * 10 * 2);
    assert!(total.reused > 0);
}
