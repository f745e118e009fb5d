//! The node-set selection coordinator.
//!
//! A node-set is the unit of placement locality. It owns the concurrent node
//! tables for both node kinds and one installed selector per kind, and it
//! serializes every selection with a node-set-wide lock so that policy state
//! (carry accumulators, round-robin cursors) is never advanced by two
//! placements at once.
//!
//! Lock order is always `node_select_lock` first, then the selector slot of
//! the kind being served. The slot lock is read-held for the duration of the
//! call and write-held only when an admin hot-swaps the policy.

use std::sync::Arc;

use dashmap::DashMap;
use metrics::{counter, gauge};
use parking_lot::{Mutex, RwLock};
use strata_core::{Config, NodeResourceType, StoreMode};
use strata_placement::{
    new_node_selector, NodeSelector, NodeView, SelectError, SelectableNode, Selection,
};
use tracing::{info, warn};

use crate::data_node::DataNode;
use crate::meta_node::MetaNode;

/// The two meta-store selectors, swapped together as one kind.
struct MetaSelectors {
    memory: Box<dyn NodeSelector>,
    rocksdb: Box<dyn NodeSelector>,
}

/// A set of nodes with serialized replica placement.
pub struct NodeSet {
    id: u64,
    data_nodes: DashMap<u64, Arc<DataNode>>,
    meta_nodes: DashMap<u64, Arc<MetaNode>>,
    /// Exclusive per selection call; guards all selector state on this set.
    node_select_lock: Mutex<()>,
    data_node_selector: RwLock<Box<dyn NodeSelector>>,
    meta_node_selector: RwLock<MetaSelectors>,
}

impl NodeSet {
    /// Creates an empty node-set with the selectors named in `config`.
    #[must_use]
    pub fn new(id: u64, config: &Config) -> Self {
        let data_name = config.placement.data_node_selector.as_str();
        let meta_name = config.placement.meta_node_selector.as_str();
        Self {
            id,
            data_nodes: DashMap::new(),
            meta_nodes: DashMap::new(),
            node_select_lock: Mutex::new(()),
            data_node_selector: RwLock::new(new_node_selector(
                data_name,
                NodeResourceType::DataDisk,
            )),
            meta_node_selector: RwLock::new(MetaSelectors {
                memory: new_node_selector(meta_name, NodeResourceType::MetaMemory),
                rocksdb: new_node_selector(meta_name, NodeResourceType::MetaRocksdb),
            }),
        }
    }

    /// Node-set id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Registers or replaces a data node.
    pub fn put_data_node(&self, node: Arc<DataNode>) {
        self.data_nodes.insert(node.id(), node);
        gauge!("strata_nodeset_data_nodes").set(self.data_nodes.len() as f64);
    }

    /// Registers or replaces a meta node.
    pub fn put_meta_node(&self, node: Arc<MetaNode>) {
        self.meta_nodes.insert(node.id(), node);
        gauge!("strata_nodeset_meta_nodes").set(self.meta_nodes.len() as f64);
    }

    /// Removes a data node and prunes selector state kept for it.
    pub fn remove_data_node(&self, id: u64) {
        if self.data_nodes.remove(&id).is_some() {
            self.data_node_selector.read().forget_node(id);
            gauge!("strata_nodeset_data_nodes").set(self.data_nodes.len() as f64);
            info!(node_set = self.id, node = id, "removed data node");
        }
    }

    /// Removes a meta node and prunes selector state kept for it.
    pub fn remove_meta_node(&self, id: u64) {
        if self.meta_nodes.remove(&id).is_some() {
            let selectors = self.meta_node_selector.read();
            selectors.memory.forget_node(id);
            selectors.rocksdb.forget_node(id);
            gauge!("strata_nodeset_meta_nodes").set(self.meta_nodes.len() as f64);
            info!(node_set = self.id, node = id, "removed meta node");
        }
    }

    /// Looks up a data node by id.
    #[must_use]
    pub fn data_node(&self, id: u64) -> Option<Arc<DataNode>> {
        self.data_nodes.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up a meta node by id.
    #[must_use]
    pub fn meta_node(&self, id: u64) -> Option<Arc<MetaNode>> {
        self.meta_nodes.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of registered data nodes.
    #[must_use]
    pub fn data_node_count(&self) -> usize {
        self.data_nodes.len()
    }

    /// Number of registered meta nodes.
    #[must_use]
    pub fn meta_node_count(&self) -> usize {
        self.meta_nodes.len()
    }

    /// Name of the currently installed data selector.
    #[must_use]
    pub fn data_node_selector_name(&self) -> &'static str {
        self.data_node_selector.read().name()
    }

    /// Name of the currently installed meta selector.
    #[must_use]
    pub fn meta_node_selector_name(&self) -> &'static str {
        self.meta_node_selector.read().memory.name()
    }

    /// Hot-swaps the data placement policy.
    ///
    /// Unknown names install the CarryWeight default.
    pub fn set_data_node_selector(&self, name: &str) {
        let mut slot = self.data_node_selector.write();
        *slot = new_node_selector(name, NodeResourceType::DataDisk);
        info!(node_set = self.id, selector = slot.name(), "installed data node selector");
    }

    /// Hot-swaps the meta placement policy for both store modes.
    ///
    /// Unknown names install the CarryWeight default.
    pub fn set_meta_node_selector(&self, name: &str) {
        let mut slot = self.meta_node_selector.write();
        slot.memory = new_node_selector(name, NodeResourceType::MetaMemory);
        slot.rocksdb = new_node_selector(name, NodeResourceType::MetaRocksdb);
        info!(node_set = self.id, selector = slot.memory.name(), "installed meta node selector");
    }

    /// Picks `replica_num` data hosts for a new data partition.
    ///
    /// # Errors
    ///
    /// Propagates the installed selector's [`SelectError`] when the fleet
    /// cannot satisfy the request; no node is charged in that case.
    pub fn select_data_hosts(
        &self,
        exclude_hosts: &[String],
        replica_num: usize,
    ) -> Result<Selection, SelectError> {
        let _select_guard = self.node_select_lock.lock();
        let selector = self.data_node_selector.read();
        let result = selector.select(self, exclude_hosts, replica_num);
        self.record_outcome("data", selector.name(), &result);
        result
    }

    /// Picks `replica_num` meta hosts for a new meta partition in the given
    /// store mode.
    ///
    /// # Errors
    ///
    /// Propagates the installed selector's [`SelectError`] when the fleet
    /// cannot satisfy the request; no node is charged in that case.
    pub fn select_meta_hosts(
        &self,
        exclude_hosts: &[String],
        replica_num: usize,
        store_mode: StoreMode,
    ) -> Result<Selection, SelectError> {
        let _select_guard = self.node_select_lock.lock();
        let selectors = self.meta_node_selector.read();
        let selector = match store_mode {
            StoreMode::Memory => &selectors.memory,
            StoreMode::RocksDb => &selectors.rocksdb,
        };
        let result = selector.select(self, exclude_hosts, replica_num);
        self.record_outcome("meta", selector.name(), &result);
        result
    }

    fn record_outcome(
        &self,
        kind: &'static str,
        selector: &str,
        result: &Result<Selection, SelectError>,
    ) {
        match result {
            Ok(_) => {
                counter!("strata_selections", "kind" => kind).increment(1);
            }
            Err(err) => {
                counter!("strata_selection_failures", "kind" => kind).increment(1);
                warn!(node_set = self.id, selector, %err, "selection failed");
            }
        }
    }
}

impl NodeView for NodeSet {
    fn nodes(&self, resource: NodeResourceType) -> Vec<Arc<dyn SelectableNode>> {
        match resource {
            NodeResourceType::DataDisk => self
                .data_nodes
                .iter()
                .map(|entry| Arc::clone(entry.value()) as Arc<dyn SelectableNode>)
                .collect(),
            NodeResourceType::MetaMemory | NodeResourceType::MetaRocksdb => self
                .meta_nodes
                .iter()
                .map(|entry| Arc::clone(entry.value()) as Arc<dyn SelectableNode>)
                .collect(),
        }
    }
}
