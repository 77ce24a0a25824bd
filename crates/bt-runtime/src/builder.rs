//! Nested-closure authoring on top of [`TreeDef`].
//!
//! ```
//! use bt_runtime::{Blackboard, State, TreeBuilder};
//!
//! let def = TreeBuilder::new()
//!     .selector(|b| {
//!         b.when_set("target", |b| b.action(|_| State::Success))
//!             .wait(3)
//!     })
//!     .build()
//!     .unwrap();
//! let mut tree = def.instantiate(1u64).unwrap();
//! assert_eq!(tree.tick(&Blackboard::new()), State::Running);
//! ```

use std::borrow::Cow;

use bt_core::Blackboard;

use crate::composite::{
    Composite, Parallel, ParallelMode, ProbabilityBranch, Selector, Sequencer, SimpleParallel,
};
use crate::decorator::{BlackboardCondition, BlackboardScope, Repeat, RepeatMode};
use crate::error::BuildError;
use crate::leaf::{Action, Condition, Wait};
use crate::node::{Node, NodeId};
use crate::state::State;
use crate::tree::TreeDef;

/// Builds a [`TreeDef`]; each container method takes a closure that adds the
/// container's children in priority order.
pub struct TreeBuilder {
    def: TreeDef,
    // One child list per open container; the first collects top-level nodes.
    frames: Vec<Vec<Option<NodeId>>>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            def: TreeDef::new(),
            frames: vec![Vec::new()],
        }
    }

    fn push(&mut self, child: Option<NodeId>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(child);
        }
    }

    /// Adds a node without children.
    pub fn leaf<N: Node>(mut self, node: N) -> Self {
        let id = self.def.add(node);
        self.push(Some(id));
        self
    }

    /// Adds a null child slot.
    pub fn null(mut self) -> Self {
        self.push(None);
        self
    }

    /// Adds `node` with the children added by `children`.
    pub fn with_children<N: Node>(mut self, node: N, children: impl FnOnce(Self) -> Self) -> Self {
        let id = self.def.add(node);
        self.frames.push(Vec::new());
        let mut this = children(self);
        let list = if this.frames.len() > 1 {
            this.frames.pop().unwrap_or_default()
        } else {
            Vec::new()
        };
        this.def.assign_children(id, list);
        this.push(Some(id));
        this
    }

    pub fn sequencer(self, children: impl FnOnce(Self) -> Self) -> Self {
        self.with_children(Composite::new(Sequencer::new()), children)
    }

    pub fn selector(self, children: impl FnOnce(Self) -> Self) -> Self {
        self.with_children(Composite::new(Selector::new()), children)
    }

    pub fn parallel(self, mode: ParallelMode, children: impl FnOnce(Self) -> Self) -> Self {
        self.with_children(Composite::new(Parallel::new(mode)), children)
    }

    pub fn simple_parallel(self, children: impl FnOnce(Self) -> Self) -> Self {
        self.with_children(Composite::new(SimpleParallel::new()), children)
    }

    pub fn probability(
        self,
        weights: impl Into<Vec<u32>>,
        children: impl FnOnce(Self) -> Self,
    ) -> Self {
        self.with_children(Composite::new(ProbabilityBranch::new(weights)), children)
    }

    pub fn repeat(self, mode: RepeatMode, child: impl FnOnce(Self) -> Self) -> Self {
        self.with_children(Repeat::new(mode), child)
    }

    pub fn scope(self, child: impl FnOnce(Self) -> Self) -> Self {
        self.with_children(BlackboardScope::new(), child)
    }

    /// Runs `child` only while `key` holds a non-null value.
    pub fn when_set(
        self,
        key: impl Into<Cow<'static, str>>,
        child: impl FnOnce(Self) -> Self,
    ) -> Self {
        self.with_children(BlackboardCondition::new(key), child)
    }

    pub fn condition(
        self,
        predicate: impl Fn(&Blackboard) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.leaf(Condition::new(predicate))
    }

    pub fn action(self, action: impl Fn(&Blackboard) -> State + Send + Sync + 'static) -> Self {
        self.leaf(Action::new(action))
    }

    pub fn wait(self, ticks: u32) -> Self {
        self.leaf(Wait::new(ticks))
    }

    /// Finishes the definition. Exactly one top-level node is required.
    pub fn build(mut self) -> Result<TreeDef, BuildError> {
        let top = std::mem::take(&mut self.frames)
            .into_iter()
            .next()
            .unwrap_or_default();
        let root = match top.as_slice() {
            [] | [None] => return Err(BuildError::MissingRoot),
            [Some(root)] => *root,
            many => return Err(BuildError::MultipleRoots(many.len())),
        };
        self.def.set_root(root)?;
        self.def.validate()?;
        Ok(self.def)
    }
}
