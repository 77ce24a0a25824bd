//! The node contract and its run/abort protocol.
//!
//! Every node, built-in or user-provided, implements [`Node`]. The lifecycle
//! bookkeeping (`started`, `initialized`, the cached state) lives in a
//! [`NodeCore`] the node embeds; the hooks only describe behavior:
//!
//! ```text
//! run:   [on_initialize once] -> on_start -> on_tick -> (terminal) on_stop
//! abort: (started) on_stop -> NotEntered
//! ```
//!
//! Leaf nodes must never block inside a hook; a leaf that relies on several
//! ticks returns `Running` and picks up again on the next tick.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use bt_core::Blackboard;

use crate::context::{tags, EvalCx, TickCx};
use crate::state::{NodeKind, State};
use crate::tree::TreeId;

/// Position of a node in a tree's flat node list.
///
/// Live trees number their nodes in depth-first priority order, so the root is
/// always `NodeId(0)` and children of a composite have increasing ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn as_u64(self) -> u64 {
        self.0 as u64
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state every node carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCore {
    name: Option<Cow<'static, str>>,
    state: State,
    started: bool,
    initialized: bool,
    id: Option<NodeId>,
    tree: Option<TreeId>,
}

impl NodeCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = Some(name.into());
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Between `on_start` and `on_stop`.
    pub fn started(&self) -> bool {
        self.started
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Id in the owning live tree; `None` for definition templates.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn tree(&self) -> Option<TreeId> {
        self.tree
    }

    pub(crate) fn bind(&mut self, tree: TreeId, id: NodeId) {
        self.tree = Some(tree);
        self.id = Some(id);
    }

    /// Back to `NotEntered` without touching `started`.
    pub(crate) fn clear_state(&mut self) {
        self.state = State::NotEntered;
    }

    pub(crate) fn reset(&mut self) {
        self.state = State::NotEntered;
        self.started = false;
    }

    /// Forget everything tied to a previous owner.
    pub(crate) fn recycle(&mut self) {
        self.reset();
        self.initialized = false;
        self.id = None;
        self.tree = None;
    }
}

/// Clone and type-identity support for boxed nodes.
///
/// Implemented automatically for every `Node + Clone`.
pub trait NodeClone {
    fn clone_node(&self) -> Box<dyn Node>;

    /// Overwrites `self` with `template`, reusing allocations. Returns `false`
    /// if the template is a different concrete type.
    fn assign_from(&mut self, template: &dyn Node) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_key(&self) -> TypeId;

    fn type_name(&self) -> &'static str;
}

impl<T: Node + Clone> NodeClone for T {
    fn clone_node(&self) -> Box<dyn Node> {
        Box::new(self.clone())
    }

    fn assign_from(&mut self, template: &dyn Node) -> bool {
        match template.as_any().downcast_ref::<T>() {
            Some(source) => {
                self.clone_from(source);
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_key(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A behavior tree node.
///
/// `Sync` lets one [`TreeDef`](crate::TreeDef) be shared by drivers on several
/// threads; each live tree is still driven by one thread at a time.
pub trait Node: NodeClone + Send + Sync + 'static {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    fn kind(&self) -> NodeKind {
        NodeKind::Leaf
    }

    /// Broadcast once after a live tree has been assembled.
    fn on_awake(&mut self) {}

    /// Once per node lifetime, before the first `on_start`.
    fn on_initialize(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {}

    fn on_start(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {}

    fn on_tick(&mut self, cx: &mut TickCx<'_>, bb: &Blackboard) -> State;

    fn on_stop(&mut self, _cx: &mut TickCx<'_>, _bb: &Blackboard) {}

    /// Read-only probe: would this node succeed right now?
    fn evaluate(&self, _cx: &EvalCx<'_>, _bb: &Blackboard) -> State {
        State::Success
    }

    /// Whether `evaluate` can change between ticks.
    fn can_re_evaluate(&self, _cx: &EvalCx<'_>) -> bool {
        false
    }

    /// Whether this node may interrupt lower-priority siblings.
    fn enable_hijack(&self) -> bool {
        false
    }

    /// Authoring hook: the child list now has `count` entries.
    fn sync_children(&mut self, _count: usize) {}

    /// Pool hook: clear extra state before the node is handed out again.
    fn on_reset(&mut self) {}
}

/// Convenience builders available on every concrete node.
pub trait NodeExt: Node + Sized {
    fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.core_mut().set_name(name);
        self
    }
}

impl<T: Node + Sized> NodeExt for T {}

pub(crate) fn run(node: &mut dyn Node, cx: &mut TickCx<'_>, bb: &Blackboard) -> State {
    if !node.core().started {
        if !node.core().initialized {
            node.on_initialize(cx, bb);
            node.core_mut().initialized = true;
        }
        node.on_start(cx, bb);
        let core = node.core_mut();
        core.started = true;
        core.state = State::Running;
        tracing::trace!(node = %cx.id(), kind = %node.kind(), "node started");
        cx.emit(tags::NODE_START, 0);
    }

    let mut state = node.on_tick(cx, bb);
    if state == State::NotEntered {
        tracing::warn!(
            node = %cx.id(),
            ty = node.type_name(),
            "on_tick returned NotEntered, treating as failure"
        );
        state = State::Failure;
    }
    node.core_mut().state = state;

    if state.is_terminal() {
        node.on_stop(cx, bb);
        node.core_mut().started = false;
        tracing::trace!(node = %cx.id(), %state, "node stopped");
        cx.emit(tags::NODE_STOP, state.code());
    }
    state
}

pub(crate) fn abort(node: &mut dyn Node, cx: &mut TickCx<'_>, bb: &Blackboard) {
    if !node.core().started {
        return;
    }
    node.on_stop(cx, bb);
    node.core_mut().reset();
    tracing::trace!(node = %cx.id(), "node aborted");
    cx.emit(tags::NODE_ABORT, 0);
}
