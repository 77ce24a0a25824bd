//! Flat node storage and the contexts handed to node hooks.
//!
//! A tree keeps every node in one `Vec`, indexed by [`NodeId`]; parents refer
//! to children by id. While a node runs it is taken out of its slot, so the
//! node can borrow itself mutably while [`TickCx`] hands out the rest of the
//! tree to run its children.

use bt_core::{Blackboard, SplitMix64};
use bt_tools::{TraceEvent, TraceSink};

use crate::node::{self, Node, NodeId};
use crate::state::State;

/// Trace tags emitted by the runtime. `a` is always the node id.
pub mod tags {
    pub const NODE_START: &str = "bt.node.start";
    /// `b` is the terminal state code.
    pub const NODE_STOP: &str = "bt.node.stop";
    pub const NODE_ABORT: &str = "bt.node.abort";
    pub const SELF_ABORT: &str = "bt.composite.self_abort";
    /// `b` is the index of the child that failed re-evaluation.
    pub const LOWER_PRIORITY_ABORT: &str = "bt.composite.lower_priority_abort";
    /// `b` is the index of the child that took over.
    pub const HIJACK: &str = "bt.selector.hijack";
    /// `b` is the selected branch index.
    pub const PROBABILITY_SELECT: &str = "bt.probability.select";
    pub const TREE_STOP: &str = "bt.tree.stop";
}

pub(crate) struct Slot {
    node: Option<Box<dyn Node>>,
    children: Vec<Option<NodeId>>,
}

#[derive(Default)]
pub(crate) struct Nodes {
    slots: Vec<Slot>,
}

impl Nodes {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn next_id(&self) -> NodeId {
        NodeId::new(self.slots.len())
    }

    pub(crate) fn push(&mut self, node: Box<dyn Node>, children: Vec<Option<NodeId>>) -> NodeId {
        let id = self.next_id();
        self.slots.push(Slot {
            node: Some(node),
            children,
        });
        id
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        id.index() < self.slots.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&dyn Node> {
        self.slots.get(id.index())?.node.as_deref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut (dyn Node + 'static)> {
        self.slots.get_mut(id.index())?.node.as_deref_mut()
    }

    pub(crate) fn children(&self, id: NodeId) -> &[Option<NodeId>] {
        self.slots
            .get(id.index())
            .map_or(&[][..], |slot| slot.children.as_slice())
    }

    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<Option<NodeId>>) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.children = children;
        }
    }

    pub(crate) fn link(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(entry) = self
            .slots
            .get_mut(parent.index())
            .and_then(|slot| slot.children.get_mut(index))
        {
            *entry = Some(child);
        }
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Node>> + '_ {
        self.slots.iter_mut().filter_map(|slot| slot.node.as_mut())
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Box<dyn Node>> + '_ {
        self.slots.drain(..).filter_map(|slot| slot.node)
    }

    pub(crate) fn run(&mut self, id: NodeId, env: &mut TickEnv, bb: &Blackboard) -> State {
        let Some(mut node) = self.take(id) else {
            return State::Failure;
        };
        let state = node::run(node.as_mut(), &mut TickCx::new(self, env, id), bb);
        self.restore(id, node);
        state
    }

    pub(crate) fn abort(&mut self, id: NodeId, env: &mut TickEnv, bb: &Blackboard) {
        let Some(mut node) = self.take(id) else {
            return;
        };
        node::abort(node.as_mut(), &mut TickCx::new(self, env, id), bb);
        self.restore(id, node);
    }

    fn take(&mut self, id: NodeId) -> Option<Box<dyn Node>> {
        self.slots.get_mut(id.index())?.node.take()
    }

    fn restore(&mut self, id: NodeId, node: Box<dyn Node>) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.node = Some(node);
        }
    }
}

/// Per-tree execution environment shared by every node during a tick.
pub(crate) struct TickEnv {
    pub(crate) tick: u64,
    pub(crate) rng: SplitMix64,
    pub(crate) trace: Option<Box<dyn TraceSink>>,
}

impl TickEnv {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            rng: SplitMix64::new(seed),
            trace: None,
        }
    }

    pub(crate) fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.trace.as_mut() {
            sink.emit(event);
        }
    }
}

/// Mutable view of the tree handed to node hooks during a tick.
pub struct TickCx<'a> {
    nodes: &'a mut Nodes,
    env: &'a mut TickEnv,
    current: NodeId,
}

impl<'a> TickCx<'a> {
    pub(crate) fn new(nodes: &'a mut Nodes, env: &'a mut TickEnv, current: NodeId) -> Self {
        Self {
            nodes,
            env,
            current,
        }
    }

    /// The node whose hook is running.
    pub fn id(&self) -> NodeId {
        self.current
    }

    /// Number of completed `Tree::tick` calls, including the current one.
    pub fn tick(&self) -> u64 {
        self.env.tick
    }

    pub fn rng(&mut self) -> &mut SplitMix64 {
        &mut self.env.rng
    }

    /// Emits a trace event tagged with the current node id.
    pub fn emit(&mut self, tag: &'static str, b: u64) {
        let event = TraceEvent::new(self.env.tick, tag)
            .with_a(self.current.as_u64())
            .with_b(b);
        self.env.emit(event);
    }

    pub fn emit_event(&mut self, event: TraceEvent) {
        self.env.emit(event);
    }

    pub fn child_count(&self) -> usize {
        self.nodes.children(self.current).len()
    }

    /// The child at `index`; `None` when out of range or a null reference.
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.nodes.children(self.current).get(index).copied().flatten()
    }

    pub fn run_child(&mut self, child: NodeId, bb: &Blackboard) -> State {
        self.nodes.run(child, self.env, bb)
    }

    pub fn abort_child(&mut self, child: NodeId, bb: &Blackboard) {
        self.nodes.abort(child, self.env, bb);
    }

    /// Resets a finished child back to `NotEntered`.
    pub fn reset_child(&mut self, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.core_mut().clear_state();
        }
    }

    /// Force-stops every child, e.g. from a parent's `on_stop`.
    pub fn abort_children(&mut self, bb: &Blackboard) {
        for index in 0..self.child_count() {
            if let Some(child) = self.child(index) {
                self.abort_child(child, bb);
            }
        }
    }

    /// Resets every child back to `NotEntered`, e.g. from a parent's `on_start`.
    pub fn reset_children(&mut self) {
        for index in 0..self.child_count() {
            if let Some(child) = self.child(index) {
                self.reset_child(child);
            }
        }
    }

    /// Read-only view for evaluation.
    pub fn probe(&self) -> EvalCx<'_> {
        EvalCx {
            nodes: &*self.nodes,
            current: self.current,
        }
    }

    pub fn evaluate_child(&self, child: NodeId, bb: &Blackboard) -> State {
        self.probe().evaluate_child(child, bb)
    }

    pub fn can_re_evaluate_child(&self, child: NodeId) -> bool {
        self.probe().can_re_evaluate_child(child)
    }

    pub fn child_enables_hijack(&self, child: NodeId) -> bool {
        self.probe().child_enables_hijack(child)
    }

    pub fn state_of(&self, child: NodeId) -> State {
        self.probe().state_of(child)
    }
}

/// Read-only view of the tree handed to `evaluate` and `can_re_evaluate`.
#[derive(Clone, Copy)]
pub struct EvalCx<'a> {
    nodes: &'a Nodes,
    current: NodeId,
}

impl<'a> EvalCx<'a> {
    pub fn id(&self) -> NodeId {
        self.current
    }

    pub fn child_count(&self) -> usize {
        self.nodes.children(self.current).len()
    }

    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.nodes.children(self.current).get(index).copied().flatten()
    }

    /// Non-null children in priority order.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes.children(self.current).iter().copied().flatten()
    }

    /// A missing child evaluates to `Failure`.
    pub fn evaluate_child(&self, child: NodeId, bb: &Blackboard) -> State {
        match self.nodes.get(child) {
            Some(node) => node.evaluate(&self.at(child), bb),
            None => State::Failure,
        }
    }

    pub fn can_re_evaluate_child(&self, child: NodeId) -> bool {
        self.nodes
            .get(child)
            .is_some_and(|node| node.can_re_evaluate(&self.at(child)))
    }

    pub fn child_enables_hijack(&self, child: NodeId) -> bool {
        self.nodes.get(child).is_some_and(|node| node.enable_hijack())
    }

    pub fn state_of(&self, child: NodeId) -> State {
        self.nodes
            .get(child)
            .map_or(State::NotEntered, |node| node.core().state())
    }

    fn at(&self, id: NodeId) -> EvalCx<'a> {
        EvalCx {
            nodes: self.nodes,
            current: id,
        }
    }
}
