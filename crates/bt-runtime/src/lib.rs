//! Reactive behavior tree runtime built on `bt-core`.
//!
//! Trees are authored once as a [`TreeDef`] (directly or through
//! [`TreeBuilder`]) and cloned into one [`Tree`] per owner. Composites support
//! conditional abort: a running branch can be interrupted when a reactive
//! condition above or beside it changes, without waiting for it to finish.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod builder;
pub mod composite;
pub mod config;
pub mod context;
pub mod decorator;
pub mod error;
pub mod leaf;
pub mod node;
pub mod pool;
pub mod state;
pub mod tree;

pub use bt_core::{BbKey, Blackboard, OwnerId};

pub use builder::TreeBuilder;
pub use composite::{
    Composite, CompositePolicy, Parallel, ParallelMode, ProbabilityBranch, Selector, Sequencer,
    SimpleParallel,
};
#[cfg(feature = "serde")]
pub use config::ConfigError;
pub use config::RuntimeConfig;
pub use context::{tags, EvalCx, TickCx};
pub use decorator::{BlackboardCondition, BlackboardScope, Repeat, RepeatMode};
pub use error::BuildError;
pub use leaf::{Action, Condition, Constant, Wait};
pub use node::{Node, NodeClone, NodeCore, NodeExt, NodeId};
pub use pool::{NodePool, PoolConfig, PoolStats, SharedNodePool};
pub use state::{AbortType, NodeKind, State};
pub use tree::{CloneOptions, NodeModifier, Tree, TreeDef, TreeId};
