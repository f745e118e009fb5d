//! Data node entity.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use strata_core::{LimitsConfig, NodeResourceType};
use strata_placement::SelectableNode;
use tracing::warn;

/// A storage node contributing disk capacity for data partitions.
///
/// Capacity fields are refreshed by the heartbeat/telemetry path and read by
/// selectors without snapshotting; a concurrent update may or may not be
/// reflected in a given selection, which at worst makes a choice suboptimal,
/// never incorrect.
pub struct DataNode {
    id: u64,
    addr: String,
    total: AtomicU64,
    available_space: AtomicU64,
    partition_count: AtomicU64,
    pending_partitions: AtomicU64,
    decommissioning: AtomicBool,
    max_partition_count: u64,
    reserved_space: u64,
}

impl DataNode {
    /// Creates a data node with the default allocation ceilings.
    ///
    /// The node starts with all of `total` reported available; the telemetry
    /// path refines that via [`DataNode::update_space`].
    #[must_use]
    pub fn new(id: u64, addr: impl Into<String>, total: u64) -> Self {
        Self::with_limits(id, addr, total, &LimitsConfig::default())
    }

    /// Creates a data node with explicit allocation ceilings.
    #[must_use]
    pub fn with_limits(id: u64, addr: impl Into<String>, total: u64, limits: &LimitsConfig) -> Self {
        Self {
            id,
            addr: addr.into(),
            total: AtomicU64::new(total),
            available_space: AtomicU64::new(total),
            partition_count: AtomicU64::new(0),
            pending_partitions: AtomicU64::new(0),
            decommissioning: AtomicBool::new(false),
            max_partition_count: limits.max_data_partitions_per_node,
            reserved_space: limits.data_node_reserved_space,
        }
    }

    /// Node id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Network address.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Total disk capacity in bytes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Currently available disk space in bytes.
    #[must_use]
    pub fn available_space(&self) -> u64 {
        self.available_space.load(Ordering::Relaxed)
    }

    /// Number of data partitions currently hosted.
    #[must_use]
    pub fn partition_count(&self) -> u64 {
        self.partition_count.load(Ordering::Relaxed)
    }

    /// Number of times this node has been picked for a new data partition.
    #[must_use]
    pub fn pending_partitions(&self) -> u64 {
        self.pending_partitions.load(Ordering::Relaxed)
    }

    /// Refreshes the capacity pair from telemetry.
    pub fn update_space(&self, total: u64, available: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.available_space.store(available, Ordering::Relaxed);
    }

    /// Refreshes the hosted-partition count from telemetry.
    pub fn set_partition_count(&self, count: u64) {
        self.partition_count.store(count, Ordering::Relaxed);
    }

    /// Marks the node as draining ahead of decommission.
    pub fn set_decommissioning(&self, draining: bool) {
        self.decommissioning.store(draining, Ordering::Relaxed);
    }

    /// Whether the node is draining.
    #[must_use]
    pub fn is_decommissioning(&self) -> bool {
        self.decommissioning.load(Ordering::Relaxed)
    }

    /// Disk-capacity check: the node is oversold once its available space
    /// falls to the reserved floor.
    #[must_use]
    pub fn can_allocate(&self) -> bool {
        self.available_space() > self.reserved_space
    }

    /// Partition-count check: not draining and under the per-node ceiling.
    #[must_use]
    pub fn can_allocate_partition(&self) -> bool {
        !self.is_decommissioning() && self.partition_count() < self.max_partition_count
    }
}

impl SelectableNode for DataNode {
    fn id(&self) -> u64 {
        self.id
    }

    fn addr(&self) -> &str {
        &self.addr
    }

    fn total_capacity(&self, resource: NodeResourceType) -> u64 {
        match resource {
            NodeResourceType::DataDisk => self.total(),
            _ => 0,
        }
    }

    fn free_capacity(&self, resource: NodeResourceType) -> u64 {
        match resource {
            NodeResourceType::DataDisk => self.available_space(),
            _ => 0,
        }
    }

    fn is_writable(&self, resource: NodeResourceType) -> bool {
        if resource != NodeResourceType::DataDisk {
            return false;
        }
        if !self.can_allocate() {
            warn!(addr = %self.addr, "data node is oversold");
            return false;
        }
        self.can_allocate_partition()
    }

    fn select_for_write(&self, resource: NodeResourceType) {
        if resource == NodeResourceType::DataDisk {
            self.pending_partitions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_core::units::GB;

    use super::*;

    #[test]
    fn test_new_node_is_writable() {
        let node = DataNode::new(1, "10.0.0.1:17310", 100 * GB);
        assert!(node.can_allocate());
        assert!(node.can_allocate_partition());
        assert!(node.is_writable(NodeResourceType::DataDisk));
    }

    #[test]
    fn test_oversold_node_cannot_allocate() {
        let node = DataNode::new(1, "10.0.0.1:17310", 100 * GB);
        node.update_space(100 * GB, 5 * GB);
        // 5 GiB available is below the 10 GiB reserved floor.
        assert!(!node.can_allocate());
        assert!(!node.is_writable(NodeResourceType::DataDisk));
    }

    #[test]
    fn test_decommissioning_blocks_allocation() {
        let node = DataNode::new(1, "10.0.0.1:17310", 100 * GB);
        node.set_decommissioning(true);
        assert!(node.can_allocate());
        assert!(!node.can_allocate_partition());
        assert!(!node.is_writable(NodeResourceType::DataDisk));
    }

    #[test]
    fn test_partition_ceiling() {
        let limits = LimitsConfig { max_data_partitions_per_node: 2, ..Default::default() };
        let node = DataNode::with_limits(1, "10.0.0.1:17310", 100 * GB, &limits);
        node.set_partition_count(2);
        assert!(!node.can_allocate_partition());
    }

    #[test]
    fn test_data_node_has_no_meta_capacity() {
        let node = DataNode::new(1, "10.0.0.1:17310", 100 * GB);
        assert_eq!(node.free_capacity(NodeResourceType::MetaMemory), 0);
        assert!(!node.is_writable(NodeResourceType::MetaRocksdb));

        node.select_for_write(NodeResourceType::MetaMemory);
        assert_eq!(node.pending_partitions(), 0);
    }

    #[test]
    fn test_charge_increments_pending() {
        let node = DataNode::new(1, "10.0.0.1:17310", 100 * GB);
        node.select_for_write(NodeResourceType::DataDisk);
        node.select_for_write(NodeResourceType::DataDisk);
        assert_eq!(node.pending_partitions(), 2);
    }
}
