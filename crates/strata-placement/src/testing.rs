//! Simulated nodes for selector tests.
//!
//! [`SimNode`] is a minimal in-memory [`SelectableNode`]: one capacity pair
//! shared by all resource types, a writability switch, and per-resource
//! charge counters so tests can assert all-or-nothing charging. [`SimNodeSet`]
//! is the matching [`NodeView`]. Both are exported for downstream crates'
//! tests as well.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use strata_core::NodeResourceType;

use crate::node::{NodeView, SelectableNode};

/// An in-memory node double.
pub struct SimNode {
    id: u64,
    addr: String,
    total: AtomicU64,
    free: AtomicU64,
    writable: AtomicBool,
    data_writes: AtomicU64,
    meta_memory_writes: AtomicU64,
    meta_rocksdb_writes: AtomicU64,
}

impl SimNode {
    /// Creates a writable node with the given capacity, in bytes.
    #[must_use]
    pub fn new(id: u64, addr: impl Into<String>, total: u64, free: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            addr: addr.into(),
            total: AtomicU64::new(total),
            free: AtomicU64::new(free),
            writable: AtomicBool::new(true),
            data_writes: AtomicU64::new(0),
            meta_memory_writes: AtomicU64::new(0),
            meta_rocksdb_writes: AtomicU64::new(0),
        })
    }

    /// Flips the writability switch.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::Relaxed);
    }

    /// Updates the free capacity, in bytes.
    pub fn set_free(&self, free: u64) {
        self.free.store(free, Ordering::Relaxed);
    }

    /// Number of times this node has been charged for the given resource.
    #[must_use]
    pub fn write_count(&self, resource: NodeResourceType) -> u64 {
        self.write_counter(resource).load(Ordering::Relaxed)
    }

    /// Total charges across all resource types.
    #[must_use]
    pub fn total_write_count(&self) -> u64 {
        self.data_writes.load(Ordering::Relaxed)
            + self.meta_memory_writes.load(Ordering::Relaxed)
            + self.meta_rocksdb_writes.load(Ordering::Relaxed)
    }

    fn write_counter(&self, resource: NodeResourceType) -> &AtomicU64 {
        match resource {
            NodeResourceType::DataDisk => &self.data_writes,
            NodeResourceType::MetaMemory => &self.meta_memory_writes,
            NodeResourceType::MetaRocksdb => &self.meta_rocksdb_writes,
        }
    }
}

impl SelectableNode for SimNode {
    fn id(&self) -> u64 {
        self.id
    }

    fn addr(&self) -> &str {
        &self.addr
    }

    fn total_capacity(&self, _resource: NodeResourceType) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    fn free_capacity(&self, _resource: NodeResourceType) -> u64 {
        self.free.load(Ordering::Relaxed)
    }

    fn is_writable(&self, _resource: NodeResourceType) -> bool {
        self.writable.load(Ordering::Relaxed)
    }

    fn select_for_write(&self, resource: NodeResourceType) {
        self.write_counter(resource).fetch_add(1, Ordering::Relaxed);
    }
}

/// An in-memory node-set view over [`SimNode`]s.
#[derive(Default)]
pub struct SimNodeSet {
    nodes: Vec<Arc<SimNode>>,
}

impl SimNodeSet {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a view over the given nodes.
    #[must_use]
    pub fn with_nodes(nodes: Vec<Arc<SimNode>>) -> Self {
        Self { nodes }
    }

    /// Adds a node to the view.
    pub fn push(&mut self, node: Arc<SimNode>) {
        self.nodes.push(node);
    }

    /// The nodes currently in the view.
    #[must_use]
    pub fn sim_nodes(&self) -> &[Arc<SimNode>] {
        &self.nodes
    }
}

impl NodeView for SimNodeSet {
    fn nodes(&self, _resource: NodeResourceType) -> Vec<Arc<dyn SelectableNode>> {
        self.nodes.iter().map(|node| Arc::clone(node) as Arc<dyn SelectableNode>).collect()
    }
}
