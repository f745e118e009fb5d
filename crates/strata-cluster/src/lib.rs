//! Node entities and the selection coordinator for the Strata cluster master.
//!
//! This crate owns the concrete node types a node-set is made of and the
//! coordinator that serializes placement within it:
//!
//! - [`DataNode`]: a storage node contributing disk capacity for data
//!   partitions.
//! - [`MetaNode`]: a metadata node contributing memory and RocksDB capacity;
//!   one entity serves both meta store modes.
//! - [`NodeSet`]: the unit of placement locality: concurrent node tables,
//!   one installed selector per kind (hot-swappable), and the locking
//!   protocol that keeps selector state consistent under concurrent
//!   placement requests.
//!
//! The placement policies themselves live in `strata-placement`; this crate
//! implements their `SelectableNode`/`NodeView` capability traits.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use strata_cluster::{DataNode, NodeSet};
//! use strata_core::Config;
//!
//! let node_set = NodeSet::new(1, &Config::default());
//! for i in 1..=3u64 {
//!     let node = Arc::new(DataNode::new(i, format!("10.0.0.{i}:17310"), 100 << 30));
//!     node.update_space(100 << 30, 80 << 30);
//!     node_set.put_data_node(node);
//! }
//!
//! let selection = node_set.select_data_hosts(&[], 3).unwrap();
//! assert_eq!(selection.hosts.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod data_node;
pub mod meta_node;
pub mod node_set;

pub use data_node::DataNode;
pub use meta_node::MetaNode;
pub use node_set::NodeSet;
