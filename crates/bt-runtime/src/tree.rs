//! Tree definitions and their live, per-owner instances.
//!
//! A [`TreeDef`] is authored topology: template nodes plus child lists, never
//! ticked. [`TreeDef::instantiate`] clones it into a [`Tree`] owned by one
//! agent. Cloning walks the definition with an explicit stack, so arbitrarily
//! deep trees do not recurse on the call stack, and numbers the live nodes in
//! depth-first priority order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bt_core::{derive_seed, Blackboard, OwnerId};
use bt_tools::{TraceEvent, TraceSink};

use crate::context::{tags, Nodes, TickEnv};
use crate::error::BuildError;
use crate::node::{Node, NodeId};
use crate::pool::NodePool;
use crate::state::{NodeKind, State};

const ROOT: NodeId = NodeId::new(0);

/// RNG stream tag for per-tree draws.
const RNG_STREAM: u64 = 0x6274_7472_6565;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id of a live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tree-{}", self.0)
    }
}

/// Visitor applied to every node while a definition is cloned.
///
/// Called once per node, in depth-first priority order, after the node is
/// bound to its tree and before its children are cloned.
pub trait NodeModifier {
    fn modify(&mut self, id: NodeId, node: &mut dyn Node);
}

impl<F> NodeModifier for F
where
    F: FnMut(NodeId, &mut dyn Node),
{
    fn modify(&mut self, id: NodeId, node: &mut dyn Node) {
        self(id, node)
    }
}

/// Optional inputs to [`TreeDef::instantiate_with`].
#[derive(Default)]
pub struct CloneOptions<'a> {
    pool: Option<&'a mut NodePool>,
    modifier: Option<&'a mut dyn NodeModifier>,
    seed: u64,
}

impl<'a> CloneOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take node instances from `pool` instead of cloning fresh ones.
    pub fn pool(mut self, pool: &'a mut NodePool) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn modifier(mut self, modifier: &'a mut dyn NodeModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Global seed mixed with the owner id to seed the tree's RNG.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Authored tree topology.
///
/// Children may be null (`None`); null children are kept in place and behave
/// as benign terminal leaves at runtime.
#[derive(Default)]
pub struct TreeDef {
    nodes: Nodes,
    root: Option<NodeId>,
}

impl TreeDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<N: Node>(&mut self, node: N) -> NodeId {
        self.add_boxed(Box::new(node))
    }

    pub fn add_boxed(&mut self, node: Box<dyn Node>) -> NodeId {
        self.nodes.push(node, Vec::new())
    }

    /// Replaces the child list of `parent`. Accepts ids or `Option<NodeId>`
    /// for lists with null slots.
    pub fn set_children<I, C>(&mut self, parent: NodeId, children: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = C>,
        C: Into<Option<NodeId>>,
    {
        if !self.nodes.contains(parent) {
            return Err(BuildError::UnknownNode(parent));
        }
        let children: Vec<Option<NodeId>> = children.into_iter().map(Into::into).collect();
        if let Some(&unknown) = children.iter().flatten().find(|c| !self.nodes.contains(**c)) {
            return Err(BuildError::UnknownNode(unknown));
        }
        self.assign_children(parent, children);
        Ok(())
    }

    pub(crate) fn assign_children(&mut self, parent: NodeId, children: Vec<Option<NodeId>>) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.sync_children(children.len());
        }
        self.nodes.set_children(parent, children);
    }

    pub fn set_root(&mut self, root: NodeId) -> Result<(), BuildError> {
        if !self.nodes.contains(root) {
            return Err(BuildError::UnknownNode(root));
        }
        self.root = Some(root);
        Ok(())
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of template nodes, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id)
    }

    /// Typed access to a template node.
    pub fn get<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn children(&self, id: NodeId) -> &[Option<NodeId>] {
        self.nodes.children(id)
    }

    /// Checks the subtree under the root: arity per node family, no node
    /// reachable twice, no cycles.
    pub fn validate(&self) -> Result<(), BuildError> {
        let root = self.root.ok_or(BuildError::MissingRoot)?;
        if !self.nodes.contains(root) {
            return Err(BuildError::UnknownNode(root));
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let seen = visited
                .get_mut(id.index())
                .ok_or(BuildError::UnknownNode(id))?;
            if std::mem::replace(seen, true) {
                return Err(BuildError::SharedNode(id));
            }

            let node = self.nodes.get(id).ok_or(BuildError::UnknownNode(id))?;
            let children = self.nodes.children(id);
            match node.kind() {
                NodeKind::Leaf if !children.is_empty() => {
                    return Err(BuildError::UnexpectedChildren(id));
                }
                NodeKind::Decorator if !matches!(children, [Some(_)]) => {
                    return Err(BuildError::MissingChild {
                        node: id,
                        found: children.iter().flatten().count(),
                    });
                }
                NodeKind::Composite if children.is_empty() => {
                    return Err(BuildError::EmptyComposite(id));
                }
                _ => {}
            }
            stack.extend(children.iter().rev().flatten().copied());
        }
        Ok(())
    }

    pub fn instantiate<O: OwnerId>(&self, owner: O) -> Result<Tree<O>, BuildError> {
        self.instantiate_with(owner, CloneOptions::default())
    }

    /// Clones the definition into a live tree for `owner`.
    pub fn instantiate_with<O: OwnerId>(
        &self,
        owner: O,
        mut options: CloneOptions<'_>,
    ) -> Result<Tree<O>, BuildError> {
        self.validate()?;
        let root = self.root.ok_or(BuildError::MissingRoot)?;
        let id = TreeId::next();

        let mut nodes = Nodes::with_capacity(self.nodes.len());
        // (definition id, live parent and slot index)
        let mut stack: Vec<(NodeId, Option<(NodeId, usize)>)> = vec![(root, None)];
        while let Some((def_id, parent)) = stack.pop() {
            let template = self
                .nodes
                .get(def_id)
                .ok_or(BuildError::UnknownNode(def_id))?;
            let mut node = match options.pool.as_deref_mut() {
                Some(pool) => pool.acquire(template),
                None => template.clone_node(),
            };

            let live_id = nodes.next_id();
            node.core_mut().bind(id, live_id);
            if let Some(modifier) = options.modifier.as_deref_mut() {
                modifier.modify(live_id, node.as_mut());
            }

            let children = self.nodes.children(def_id);
            nodes.push(node, vec![None; children.len()]);
            if let Some((parent, index)) = parent {
                nodes.link(parent, index, live_id);
            }
            for (index, child) in children.iter().enumerate().rev() {
                if let Some(child) = *child {
                    stack.push((child, Some((live_id, index))));
                }
            }
        }

        for node in nodes.iter_mut() {
            node.on_awake();
        }
        tracing::debug!(tree = %id, owner = ?owner, nodes = nodes.len(), "tree instantiated");

        let seed = derive_seed(options.seed, owner.stable_id(), RNG_STREAM);
        Ok(Tree {
            id,
            owner,
            nodes,
            env: TickEnv::new(seed),
            last_bb: None,
        })
    }
}

impl fmt::Debug for TreeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDef")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .finish()
    }
}

/// A live tree owned by one agent.
///
/// Node ids are dense and depth-first: the root is always `NodeId(0)`.
pub struct Tree<O: OwnerId = u64> {
    id: TreeId,
    owner: O,
    nodes: Nodes,
    env: TickEnv,
    last_bb: Option<Blackboard>,
}

impl<O: OwnerId> Tree<O> {
    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn owner(&self) -> O {
        self.owner
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    /// State of the root.
    pub fn state(&self) -> State {
        self.nodes
            .get(ROOT)
            .map_or(State::NotEntered, |node| node.core().state())
    }

    pub fn state_of(&self, id: NodeId) -> Option<State> {
        self.nodes.get(id).map(|node| node.core().state())
    }

    pub fn node(&self, id: NodeId) -> Option<&dyn Node> {
        self.nodes.get(id)
    }

    /// Typed access to a node, `None` if `id` holds another type.
    pub fn get<T: Node>(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id)?.as_any().downcast_ref::<T>()
    }

    pub fn children(&self, id: NodeId) -> &[Option<NodeId>] {
        self.nodes.children(id)
    }

    /// First node, in priority order, with the given debug name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.ids().find(|&id| {
            self.nodes
                .get(id)
                .and_then(|node| node.core().name())
                .is_some_and(|n| n == name)
        })
    }

    /// Every node id in depth-first priority order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    pub fn tick_count(&self) -> u64 {
        self.env.tick
    }

    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) {
        self.env.trace = Some(Box::new(sink));
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.env.trace.take()
    }

    /// Ticks the root once.
    ///
    /// A root that already finished is not ticked again: its terminal state is
    /// returned until [`Tree::stop`] resets the tree.
    pub fn tick(&mut self, bb: &Blackboard) -> State {
        let state = self.state();
        if state.is_terminal() {
            return state;
        }
        self.env.tick += 1;
        self.last_bb = Some(bb.clone());
        self.nodes.run(ROOT, &mut self.env, bb)
    }

    /// Aborts everything that is running and resets every node to
    /// `NotEntered`.
    ///
    /// `on_stop` hooks see the blackboard of the last tick.
    pub fn stop(&mut self) {
        let bb = self.last_bb.clone().unwrap_or_default();
        self.nodes.abort(ROOT, &mut self.env, &bb);
        for node in self.nodes.iter_mut() {
            node.core_mut().reset();
        }
        let event = TraceEvent::new(self.env.tick, tags::TREE_STOP).with_a(ROOT.as_u64());
        self.env.emit(event);
        tracing::debug!(tree = %self.id, ticks = self.env.tick, "tree stopped");
    }

    /// Aborts running nodes and hands every node to `pool`. Returns how many
    /// the pool kept.
    pub fn recycle(mut self, pool: &mut NodePool) -> usize {
        let bb = self.last_bb.take().unwrap_or_default();
        self.nodes.abort(ROOT, &mut self.env, &bb);
        let total = self.nodes.len();
        let mut kept = 0;
        for node in self.nodes.drain() {
            if pool.release(node) {
                kept += 1;
            }
        }
        tracing::debug!(tree = %self.id, kept, discarded = total - kept, "tree recycled");
        kept
    }
}

impl<O: OwnerId> fmt::Debug for Tree<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("nodes", &self.nodes.len())
            .field("state", &self.state())
            .field("ticks", &self.env.tick)
            .finish()
    }
}
