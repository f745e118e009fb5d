//! Meta node entity.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use strata_core::{LimitsConfig, NodeResourceType, StoreMode};
use strata_placement::SelectableNode;

/// A metadata node.
///
/// One entity backs both meta resource universes: partitions in memory store
/// mode draw on the `total`/`used` pair, partitions in RocksDB store mode on
/// the `rocksdb_total`/`rocksdb_used` pair. Writability and charge counters
/// are kept per store mode.
pub struct MetaNode {
    id: u64,
    addr: String,
    total: AtomicU64,
    used: AtomicU64,
    rocksdb_total: AtomicU64,
    rocksdb_used: AtomicU64,
    partition_count: AtomicU64,
    pending_memory_partitions: AtomicU64,
    pending_rocksdb_partitions: AtomicU64,
    decommissioning: AtomicBool,
    max_partition_count: u64,
}

impl MetaNode {
    /// Creates a meta node with the default allocation ceilings.
    #[must_use]
    pub fn new(id: u64, addr: impl Into<String>, total: u64, rocksdb_total: u64) -> Self {
        Self::with_limits(id, addr, total, rocksdb_total, &LimitsConfig::default())
    }

    /// Creates a meta node with explicit allocation ceilings.
    #[must_use]
    pub fn with_limits(
        id: u64,
        addr: impl Into<String>,
        total: u64,
        rocksdb_total: u64,
        limits: &LimitsConfig,
    ) -> Self {
        Self {
            id,
            addr: addr.into(),
            total: AtomicU64::new(total),
            used: AtomicU64::new(0),
            rocksdb_total: AtomicU64::new(rocksdb_total),
            rocksdb_used: AtomicU64::new(0),
            partition_count: AtomicU64::new(0),
            pending_memory_partitions: AtomicU64::new(0),
            pending_rocksdb_partitions: AtomicU64::new(0),
            decommissioning: AtomicBool::new(false),
            max_partition_count: limits.max_meta_partitions_per_node,
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

    /// Free capacity of the given store mode, in bytes.
    #[must_use]
    pub fn free_space(&self, mode: StoreMode) -> u64 {
        match mode {
            StoreMode::Memory => {
                self.total.load(Ordering::Relaxed).saturating_sub(self.used.load(Ordering::Relaxed))
            }
            StoreMode::RocksDb => self
                .rocksdb_total
                .load(Ordering::Relaxed)
                .saturating_sub(self.rocksdb_used.load(Ordering::Relaxed)),
        }
    }

    /// Refreshes the memory capacity pair from telemetry.
    pub fn update_memory(&self, total: u64, used: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.used.store(used, Ordering::Relaxed);
    }

    /// Refreshes the RocksDB capacity pair from telemetry.
    pub fn update_rocksdb(&self, total: u64, used: u64) {
        self.rocksdb_total.store(total, Ordering::Relaxed);
        self.rocksdb_used.store(used, Ordering::Relaxed);
    }

    /// Refreshes the hosted-partition count from telemetry.
    pub fn set_partition_count(&self, count: u64) {
        self.partition_count.store(count, Ordering::Relaxed);
    }

    /// Marks the node as draining ahead of decommission.
    pub fn set_decommissioning(&self, draining: bool) {
        self.decommissioning.store(draining, Ordering::Relaxed);
    }

    /// Number of times this node has been picked for a new partition in the
    /// given store mode.
    #[must_use]
    pub fn pending_partitions(&self, mode: StoreMode) -> u64 {
        match mode {
            StoreMode::Memory => self.pending_memory_partitions.load(Ordering::Relaxed),
            StoreMode::RocksDb => self.pending_rocksdb_partitions.load(Ordering::Relaxed),
        }
    }

    /// Whether the node may accept a new partition in the given store mode.
    #[must_use]
    pub fn is_writable(&self, mode: StoreMode) -> bool {
        self.free_space(mode) > 0
            && !self.decommissioning.load(Ordering::Relaxed)
            && self.partition_count.load(Ordering::Relaxed) < self.max_partition_count
    }
}

impl SelectableNode for MetaNode {
    fn id(&self) -> u64 {
        self.id
    }

    fn addr(&self) -> &str {
        &self.addr
    }

    fn total_capacity(&self, resource: NodeResourceType) -> u64 {
        match resource {
            NodeResourceType::MetaMemory => self.total.load(Ordering::Relaxed),
            NodeResourceType::MetaRocksdb => self.rocksdb_total.load(Ordering::Relaxed),
            NodeResourceType::DataDisk => 0,
        }
    }

    fn free_capacity(&self, resource: NodeResourceType) -> u64 {
        match resource.store_mode() {
            Some(mode) => self.free_space(mode),
            None => 0,
        }
    }

    fn is_writable(&self, resource: NodeResourceType) -> bool {
        match resource.store_mode() {
            Some(mode) => self.is_writable(mode),
            None => false,
        }
    }

    fn select_for_write(&self, resource: NodeResourceType) {
        match resource {
            NodeResourceType::MetaMemory => {
                self.pending_memory_partitions.fetch_add(1, Ordering::Relaxed);
            }
            NodeResourceType::MetaRocksdb => {
                self.pending_rocksdb_partitions.fetch_add(1, Ordering::Relaxed);
            }
            NodeResourceType::DataDisk => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_core::units::GB;

    use super::*;

    #[test]
    fn test_store_modes_are_independent() {
        let node = MetaNode::new(1, "10.0.0.1:17210", 64 * GB, 500 * GB);
        node.update_memory(64 * GB, 64 * GB);

        // Memory is full, RocksDB still has room.
        assert!(!node.is_writable(StoreMode::Memory));
        assert!(node.is_writable(StoreMode::RocksDb));
        assert_eq!(node.free_space(StoreMode::Memory), 0);
        assert_eq!(node.free_space(StoreMode::RocksDb), 500 * GB);
    }

    #[test]
    fn test_decommissioning_blocks_both_modes() {
        let node = MetaNode::new(1, "10.0.0.1:17210", 64 * GB, 500 * GB);
        node.set_decommissioning(true);
        assert!(!node.is_writable(StoreMode::Memory));
        assert!(!node.is_writable(StoreMode::RocksDb));
    }

    #[test]
    fn test_partition_ceiling_blocks_both_modes() {
        let limits = LimitsConfig { max_meta_partitions_per_node: 1, ..Default::default() };
        let node = MetaNode::with_limits(1, "10.0.0.1:17210", 64 * GB, 500 * GB, &limits);
        node.set_partition_count(1);
        assert!(!node.is_writable(StoreMode::Memory));
        assert!(!node.is_writable(StoreMode::RocksDb));
    }

    #[test]
    fn test_charges_are_tracked_per_mode() {
        let node = MetaNode::new(1, "10.0.0.1:17210", 64 * GB, 500 * GB);
        node.select_for_write(NodeResourceType::MetaMemory);
        node.select_for_write(NodeResourceType::MetaMemory);
        node.select_for_write(NodeResourceType::MetaRocksdb);

        assert_eq!(node.pending_partitions(StoreMode::Memory), 2);
        assert_eq!(node.pending_partitions(StoreMode::RocksDb), 1);
    }

    #[test]
    fn test_used_may_exceed_total() {
        let node = MetaNode::new(1, "10.0.0.1:17210", 64 * GB, 500 * GB);
        // Telemetry can briefly report used > total; free saturates at zero.
        node.update_memory(64 * GB, 80 * GB);
        assert_eq!(node.free_space(StoreMode::Memory), 0);
        assert!(!node.is_writable(StoreMode::Memory));
    }

    #[test]
    fn test_no_data_disk_capacity() {
        let node = MetaNode::new(1, "10.0.0.1:17210", 64 * GB, 500 * GB);
        assert_eq!(SelectableNode::free_capacity(&node, NodeResourceType::DataDisk), 0);
        assert!(!SelectableNode::is_writable(&node, NodeResourceType::DataDisk));
    }
}
