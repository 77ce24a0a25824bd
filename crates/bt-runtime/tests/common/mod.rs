#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bt_runtime::{Blackboard, Node, NodeCore, State, TickCx};

/// Shared handle to a [`Scripted`] leaf: set what it returns, read what
/// happened to it. Clones of the leaf share the same handle.
#[derive(Debug)]
pub struct Script {
    state: AtomicU64,
    pub ticks: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub inits: AtomicUsize,
}

impl Script {
    pub fn set(&self, state: State) {
        self.state.store(state.code(), Ordering::SeqCst);
    }

    pub fn returns(&self) -> State {
        match self.state.load(Ordering::SeqCst) {
            0 => State::NotEntered,
            1 => State::Running,
            2 => State::Success,
            _ => State::Failure,
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct Scripted {
    core: NodeCore,
    script: Arc<Script>,
}

pub fn scripted(state: State) -> (Scripted, Arc<Script>) {
    let script = Arc::new(Script {
        state: AtomicU64::new(state.code()),
        ticks: AtomicUsize::new(0),
        starts: AtomicUsize::new(0),
        stops: AtomicUsize::new(0),
        inits: AtomicUsize::new(0),
    });
    let node = Scripted {
        core: NodeCore::new(),
        script: Arc::clone(&script),
    };
    (node, script)
}

impl Node for Scripted {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn on_initialize(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {
        self.script.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn on_start(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {
        self.script.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_tick(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) -> State {
        self.script.ticks.fetch_add(1, Ordering::SeqCst);
        self.script.returns()
    }

    fn on_stop(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {
        self.script.stops.fetch_add(1, Ordering::SeqCst);
    }
}
