//! Type-keyed recycling of node instances.
//!
//! Retired nodes are kept per concrete type and handed out again instead of
//! cloning from scratch. A recycled node is overwritten from the requested
//! template, its lifecycle state is cleared and its [`Node::on_reset`] hook
//! runs before it leaves the pool.

use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::state::NodeKind;

/// Default per-type capacities by node family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    pub leaf_capacity: usize,
    pub composite_capacity: usize,
    pub decorator_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            leaf_capacity: 64,
            composite_capacity: 16,
            decorator_capacity: 16,
        }
    }
}

impl PoolConfig {
    pub fn capacity_for(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Leaf => self.leaf_capacity,
            NodeKind::Composite => self.composite_capacity,
            NodeKind::Decorator => self.decorator_capacity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoolStats {
    /// Fresh clones made because no retired instance was available.
    pub created: u64,
    /// Acquisitions served from retired instances.
    pub reused: u64,
    /// Releases accepted back into the pool.
    pub returned: u64,
    /// Releases dropped because the pool was full.
    pub discarded: u64,
}

impl PoolStats {
    /// Share of acquisitions served by reuse, in `[0, 1]`.
    pub fn reuse_rate(&self) -> f64 {
        let acquired = self.created + self.reused;
        if acquired == 0 {
            0.0
        } else {
            self.reused as f64 / acquired as f64
        }
    }

    fn merge(&mut self, other: &PoolStats) {
        self.created += other.created;
        self.reused += other.reused;
        self.returned += other.returned;
        self.discarded += other.discarded;
    }
}

struct Entry {
    free: VecDeque<Box<dyn Node>>,
    capacity: usize,
    stats: PoolStats,
}

impl Entry {
    fn new(capacity: usize) -> Self {
        Self {
            free: VecDeque::new(),
            capacity,
            stats: PoolStats::default(),
        }
    }
}

/// Single-owner node pool. Wrap it in a [`SharedNodePool`] to share it.
#[derive(Default)]
pub struct NodePool {
    config: PoolConfig,
    entries: HashMap<TypeId, Entry>,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn entry(&mut self, key: TypeId, kind: NodeKind) -> &mut Entry {
        let capacity = self.config.capacity_for(kind);
        self.entries
            .entry(key)
            .or_insert_with(|| Entry::new(capacity))
    }

    /// A node equal to `template` with cleared lifecycle state.
    ///
    /// Falls back to a fresh clone when nothing of that type is pooled.
    pub fn acquire(&mut self, template: &dyn Node) -> Box<dyn Node> {
        let entry = self.entry(template.type_key(), template.kind());
        let recycled = entry
            .free
            .pop_front()
            .and_then(|mut node| node.assign_from(template).then_some(node));
        let mut node = match recycled {
            Some(node) => {
                entry.stats.reused += 1;
                node
            }
            None => {
                entry.stats.created += 1;
                template.clone_node()
            }
        };
        node.core_mut().recycle();
        node.on_reset();
        node
    }

    /// Returns `node` to the pool. Returns `false` if the pool for its type is
    /// full and the node was dropped.
    pub fn release(&mut self, mut node: Box<dyn Node>) -> bool {
        let type_name = node.type_name();
        let entry = self.entry(node.type_key(), node.kind());
        if entry.free.len() >= entry.capacity {
            entry.stats.discarded += 1;
            tracing::debug!(
                ty = type_name,
                capacity = entry.capacity,
                "node pool full, discarding"
            );
            return false;
        }
        node.core_mut().recycle();
        node.on_reset();
        entry.free.push_back(node);
        entry.stats.returned += 1;
        true
    }

    /// Overrides the capacity for one node type, dropping any excess.
    pub fn set_capacity<T: Node>(&mut self, capacity: usize) {
        let entry = self
            .entries
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Entry::new(capacity));
        entry.capacity = capacity;
        entry.free.truncate(capacity);
    }

    pub fn capacity_of<T: Node>(&self, kind: NodeKind) -> usize {
        self.entries
            .get(&TypeId::of::<T>())
            .map_or(self.config.capacity_for(kind), |entry| entry.capacity)
    }

    pub fn stats_of<T: Node>(&self) -> PoolStats {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|entry| entry.stats)
            .unwrap_or_default()
    }

    /// Retired instances of `T` ready for reuse.
    pub fn available<T: Node>(&self) -> usize {
        self.entries
            .get(&TypeId::of::<T>())
            .map_or(0, |entry| entry.free.len())
    }

    /// Counters summed over every node type.
    pub fn total(&self) -> PoolStats {
        let mut total = PoolStats::default();
        for entry in self.entries.values() {
            total.merge(&entry.stats);
        }
        total
    }

    /// Drops every pooled instance. Counters and capacities are kept.
    pub fn clear(&mut self) {
        for entry in self.entries.values_mut() {
            entry.free.clear();
        }
    }
}

impl std::fmt::Debug for NodePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodePool")
            .field("config", &self.config)
            .field("types", &self.entries.len())
            .field("total", &self.total())
            .finish()
    }
}

/// Cloneable handle to one pool; acquire and release are serialized.
#[derive(Debug, Clone, Default)]
pub struct SharedNodePool {
    inner: Arc<Mutex<NodePool>>,
}

impl SharedNodePool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NodePool::with_config(config))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NodePool> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self, template: &dyn Node) -> Box<dyn Node> {
        self.lock().acquire(template)
    }

    pub fn release(&self, node: Box<dyn Node>) -> bool {
        self.lock().release(node)
    }

    pub fn total(&self) -> PoolStats {
        self.lock().total()
    }

    /// Runs `f` with the pool locked, e.g. to instantiate a tree through it.
    pub fn with<R>(&self, f: impl FnOnce(&mut NodePool) -> R) -> R {
        f(&mut self.lock())
    }
}
