//! JSON tree files.
//!
//! ```json
//! {
//!   "config": { "seed": 7 },
//!   "blackboard": { "target": "gate" },
//!   "root": {
//!     "type": "selector",
//!     "children": [
//!       { "type": "when_set", "key": "target", "child": { "type": "wait", "ticks": 2 } },
//!       null,
//!       { "type": "succeed", "name": "idle" }
//!     ]
//!   }
//! }
//! ```
//!
//! Blackboard values are stored as `serde_json::Value` under their key name.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bt_core::{BbKey, Blackboard};
use bt_runtime::{
    AbortType, Action, BlackboardCondition, BlackboardScope, BuildError, Composite, Condition,
    Constant, Node, NodeExt, NodeId, Parallel, ParallelMode, ProbabilityBranch, Repeat, RepeatMode,
    RuntimeConfig, Selector, Sequencer, SimpleParallel, State, TreeDef, Wait,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeFile {
    #[serde(default)]
    pub config: RuntimeConfig,
    #[serde(default)]
    pub blackboard: BTreeMap<String, Value>,
    pub root: NodeSpec,
}

impl TreeFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tree from {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse tree from {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn build(&self) -> Result<TreeDef, BuildError> {
        let mut def = TreeDef::new();
        let root = self.root.add_to(&mut def)?;
        def.set_root(root)?;
        def.validate()?;
        Ok(def)
    }

    /// A blackboard holding the file's initial values. JSON `null` becomes a
    /// present-but-null entry.
    pub fn blackboard(&self) -> Blackboard {
        let bb = Blackboard::new();
        for (key, value) in &self.blackboard {
            if value.is_null() {
                bb.set_null(key);
            } else {
                bb.set(&json_key(key), value.clone());
            }
        }
        bb
    }
}

pub fn json_key(name: &str) -> BbKey<Value> {
    BbKey::owned(name.to_owned())
}

/// One node, tagged by `"type"`. Every node accepts an optional `"name"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKindSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKindSpec {
    Sequencer {
        #[serde(default)]
        abort: AbortType,
        children: Vec<Option<NodeSpec>>,
    },
    Selector {
        #[serde(default)]
        abort: AbortType,
        children: Vec<Option<NodeSpec>>,
    },
    Parallel {
        #[serde(default)]
        mode: ParallelMode,
        #[serde(default)]
        abort: AbortType,
        children: Vec<Option<NodeSpec>>,
    },
    SimpleParallel {
        children: Vec<Option<NodeSpec>>,
    },
    Probability {
        /// Missing weights default to 1.
        #[serde(default)]
        weights: Vec<u32>,
        children: Vec<Option<NodeSpec>>,
    },
    /// `times` for a fixed count, `min`/`max` for a random one, neither for
    /// forever.
    Repeat {
        #[serde(default)]
        times: Option<u32>,
        #[serde(default)]
        min: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
        child: Box<NodeSpec>,
    },
    Scope {
        child: Box<NodeSpec>,
    },
    WhenSet {
        key: String,
        #[serde(default)]
        abort: AbortType,
        child: Box<NodeSpec>,
    },
    Succeed,
    Fail,
    Running,
    Wait {
        ticks: u32,
    },
    /// Writes `value` under `key`, then succeeds.
    Set {
        key: String,
        value: Value,
    },
    /// Removes `key`, then succeeds.
    Unset {
        key: String,
    },
    /// Reactive check: `key` holds a non-null value, equal to `equals` if
    /// given.
    Check {
        key: String,
        #[serde(default)]
        equals: Option<Value>,
        #[serde(default)]
        abort: AbortType,
    },
    Log {
        message: String,
    },
}

impl NodeSpec {
    fn named<N: Node>(&self, node: N) -> Box<dyn Node> {
        match &self.name {
            Some(name) => Box::new(node.named(name.clone())),
            None => Box::new(node),
        }
    }

    /// Adds this node and its subtree to `def`.
    pub fn add_to(&self, def: &mut TreeDef) -> Result<NodeId, BuildError> {
        let node = match &self.kind {
            NodeKindSpec::Sequencer { abort, .. } => {
                self.named(Composite::new(Sequencer::new()).with_abort(*abort))
            }
            NodeKindSpec::Selector { abort, .. } => {
                self.named(Composite::new(Selector::new()).with_abort(*abort))
            }
            NodeKindSpec::Parallel { mode, abort, .. } => {
                self.named(Composite::new(Parallel::new(*mode)).with_abort(*abort))
            }
            NodeKindSpec::SimpleParallel { .. } => {
                self.named(Composite::new(SimpleParallel::new()))
            }
            NodeKindSpec::Probability { weights, .. } => {
                self.named(Composite::new(ProbabilityBranch::new(weights.clone())))
            }
            NodeKindSpec::Repeat { times, min, max, .. } => {
                let mode = match (times, min, max) {
                    (Some(times), _, _) => RepeatMode::times(*times),
                    (None, Some(min), max) => RepeatMode::between(*min, max.unwrap_or(*min)),
                    (None, None, Some(max)) => RepeatMode::between(0, *max),
                    (None, None, None) => RepeatMode::Forever,
                };
                self.named(Repeat::new(mode))
            }
            NodeKindSpec::Scope { .. } => self.named(BlackboardScope::new()),
            NodeKindSpec::WhenSet { key, abort, .. } => {
                self.named(BlackboardCondition::new(key.clone()).with_abort(*abort))
            }
            NodeKindSpec::Succeed => self.named(Constant::success()),
            NodeKindSpec::Fail => self.named(Constant::failure()),
            NodeKindSpec::Running => self.named(Constant::running()),
            NodeKindSpec::Wait { ticks } => self.named(Wait::new(*ticks)),
            NodeKindSpec::Set { key, value } => {
                let key = json_key(key);
                let value = value.clone();
                self.named(Action::new(move |bb| {
                    bb.set(&key, value.clone());
                    State::Success
                }))
            }
            NodeKindSpec::Unset { key } => {
                let key = key.clone();
                self.named(Action::new(move |bb| {
                    bb.remove(&key);
                    State::Success
                }))
            }
            NodeKindSpec::Check { key, equals, abort } => {
                let key = json_key(key);
                let equals = equals.clone();
                let check = move |bb: &Blackboard| match &equals {
                    Some(expected) => bb.with(&key, |value| value == expected).unwrap_or(false),
                    None => bb.has_value(&key),
                };
                self.named(Condition::new(check).with_abort(*abort))
            }
            NodeKindSpec::Log { message } => {
                let message = message.clone();
                self.named(Action::new(move |_| {
                    tracing::info!(target: "bt::log", "{message}");
                    State::Success
                }))
            }
        };
        let id = def.add_boxed(node);

        match &self.kind {
            NodeKindSpec::Sequencer { children, .. }
            | NodeKindSpec::Selector { children, .. }
            | NodeKindSpec::Parallel { children, .. }
            | NodeKindSpec::SimpleParallel { children }
            | NodeKindSpec::Probability { children, .. } => {
                let mut ids = Vec::with_capacity(children.len());
                for child in children {
                    ids.push(match child {
                        Some(child) => Some(child.add_to(def)?),
                        None => None,
                    });
                }
                def.set_children(id, ids)?;
            }
            NodeKindSpec::Repeat { child, .. }
            | NodeKindSpec::Scope { child }
            | NodeKindSpec::WhenSet { child, .. } => {
                let child = child.add_to(def)?;
                def.set_children(id, [child])?;
            }
            _ => {}
        }
        Ok(id)
    }
}
