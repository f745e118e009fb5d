//! Capability traits selectors operate on.
//!
//! A selector never sees the concrete node entities of the cluster layer;
//! it works against [`SelectableNode`] (one node's identity, capacity,
//! writability and charge hook) and [`NodeView`] (read access to the nodes of
//! one node-set). The resource type is a parameter of every capacity-related
//! method so that a single meta-node entity can serve both the memory and the
//! RocksDB resource universes.

use std::sync::Arc;

use strata_core::NodeResourceType;

/// One candidate node as seen by a placement policy.
pub trait SelectableNode: Send + Sync {
    /// Node id, unique and stable within the node-set.
    fn id(&self) -> u64;

    /// Network address, unique within the node-set.
    fn addr(&self) -> &str;

    /// Total capacity of the given resource, in bytes.
    fn total_capacity(&self, resource: NodeResourceType) -> u64;

    /// Currently free capacity of the given resource, in bytes.
    fn free_capacity(&self, resource: NodeResourceType) -> u64;

    /// Whether the node may accept a new partition of the given resource
    /// type right now (not draining, under its partition ceiling, not
    /// oversold).
    ///
    /// A writable node must report positive free capacity for the resource;
    /// the carry advancement loop relies on writable candidates having
    /// nonzero weight to make progress.
    fn is_writable(&self, resource: NodeResourceType) -> bool;

    /// Charge hook: records that the node has been picked to host a new
    /// partition of the given resource type. Invoked exactly once per pick,
    /// and only after the whole selection is known to succeed.
    fn select_for_write(&self, resource: NodeResourceType);
}

/// Read-only view over the nodes of one node-set.
///
/// Implementations must be safe for concurrent readers; selectors only
/// iterate, they never mutate the view.
pub trait NodeView: Send + Sync {
    /// Snapshot of the nodes backing the given resource type.
    ///
    /// Both meta resource types resolve to the same node population.
    fn nodes(&self, resource: NodeResourceType) -> Vec<Arc<dyn SelectableNode>>;
}

/// Snapshot the view and sort by node id ascending.
///
/// The backing store iterates in unspecified order; every policy sorts by id
/// first so repeated calls against identical state are reproducible.
pub(crate) fn sorted_nodes(
    view: &dyn NodeView,
    resource: NodeResourceType,
) -> Vec<Arc<dyn SelectableNode>> {
    let mut nodes = view.nodes(resource);
    nodes.sort_by_key(|node| node.id());
    nodes
}

/// True when `addr` appears in the exclusion list.
pub(crate) fn is_excluded(exclude_hosts: &[String], addr: &str) -> bool {
    exclude_hosts.iter().any(|host| host == addr)
}
