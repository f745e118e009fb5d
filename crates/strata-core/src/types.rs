//! Common types used throughout Strata.

use serde::{Deserialize, Serialize};

/// The resource universe a placement decision draws from.
///
/// Data partitions live on data-node disks; meta partitions live on meta
/// nodes in one of two store modes. The two meta variants address the same
/// node entity but different capacity metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeResourceType {
    /// Disk space on a data node.
    DataDisk,
    /// Memory on a meta node.
    MetaMemory,
    /// RocksDB disk space on a meta node.
    MetaRocksdb,
}

impl NodeResourceType {
    /// Returns true for the two meta-node variants.
    #[must_use]
    pub const fn is_meta(&self) -> bool {
        matches!(self, Self::MetaMemory | Self::MetaRocksdb)
    }

    /// The store mode a meta resource type corresponds to.
    ///
    /// Returns `None` for [`NodeResourceType::DataDisk`].
    #[must_use]
    pub const fn store_mode(&self) -> Option<StoreMode> {
        match self {
            Self::DataDisk => None,
            Self::MetaMemory => Some(StoreMode::Memory),
            Self::MetaRocksdb => Some(StoreMode::RocksDb),
        }
    }
}

impl std::fmt::Display for NodeResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DataDisk => "DataDisk",
            Self::MetaMemory => "MetaMemory",
            Self::MetaRocksdb => "MetaRocksdb",
        };
        write!(f, "{name}")
    }
}

/// Storage engine of a meta partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreMode {
    /// Partition state held in memory.
    Memory,
    /// Partition state held in RocksDB.
    RocksDb,
}

impl StoreMode {
    /// The resource type this store mode allocates from.
    #[must_use]
    pub const fn resource_type(&self) -> NodeResourceType {
        match self {
            Self::Memory => NodeResourceType::MetaMemory,
            Self::RocksDb => NodeResourceType::MetaRocksdb,
        }
    }
}

/// A replication-group member as handed to the partition-creation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Node id, unique within the node-set.
    pub id: u64,
    /// Network address of the node.
    pub addr: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_store_mode() {
        assert_eq!(NodeResourceType::DataDisk.store_mode(), None);
        assert_eq!(NodeResourceType::MetaMemory.store_mode(), Some(StoreMode::Memory));
        assert_eq!(NodeResourceType::MetaRocksdb.store_mode(), Some(StoreMode::RocksDb));
    }

    #[test]
    fn test_store_mode_round_trip() {
        assert_eq!(StoreMode::Memory.resource_type(), NodeResourceType::MetaMemory);
        assert_eq!(StoreMode::RocksDb.resource_type(), NodeResourceType::MetaRocksdb);
    }

    #[test]
    fn test_is_meta() {
        assert!(!NodeResourceType::DataDisk.is_meta());
        assert!(NodeResourceType::MetaMemory.is_meta());
        assert!(NodeResourceType::MetaRocksdb.is_meta());
    }

    #[test]
    fn test_resource_type_display() {
        assert_eq!(NodeResourceType::DataDisk.to_string(), "DataDisk");
        assert_eq!(NodeResourceType::MetaRocksdb.to_string(), "MetaRocksdb");
    }
}
