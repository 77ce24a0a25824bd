use bt_runtime::{
    AbortType, Blackboard, CloneOptions, Condition, Constant, NodePool, State, TreeBuilder, TreeDef,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn always_true(_bb: &Blackboard) -> bool {
    true
}

fn reactive_selector(conditions: usize) -> TreeDef {
    TreeBuilder::new()
        .selector(|s| {
            let s = (0..conditions).fold(s, |s, _| {
                s.leaf(Condition::new(|_: &Blackboard| false).with_abort(AbortType::LowerPriority))
            });
            s.sequencer(|q| q.condition(always_true).leaf(Constant::running()))
        })
        .build()
        .expect("bench tree is valid")
}

fn bench_tick(c: &mut Criterion) {
    let def = reactive_selector(32);
    let mut tree = def.instantiate(1u64).expect("instantiate");
    let bb = Blackboard::new();
    // Walk the cursor past every condition so each tick runs the hijack check.
    for _ in 0..64 {
        assert_eq!(tree.tick(&bb), State::Running);
    }

    c.bench_function("bt-runtime/tick(hijack_checks=32)", |b| {
        b.iter(|| black_box(tree.tick(&bb)))
    });
}

fn bench_pool(c: &mut Criterion) {
    let def = reactive_selector(32);
    let mut pool = NodePool::new();

    c.bench_function("bt-runtime/instantiate+recycle(nodes=36)", |b| {
        b.iter(|| {
            let tree = def
                .instantiate_with(7u64, CloneOptions::new().pool(&mut pool))
                .expect("instantiate");
            black_box(tree.recycle(&mut pool))
        })
    });

    c.bench_function("bt-runtime/instantiate(nodes=36)", |b| {
        b.iter(|| black_box(def.instantiate(7u64).expect("instantiate").len()))
    });
}

criterion_group!(benches, bench_tick, bench_pool);
criterion_main!(benches);
