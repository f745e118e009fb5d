//! Replica placement policies for the Strata cluster master.
//!
//! Given a view over the nodes of one node-set, a selector picks `N` distinct
//! writable nodes to host the replicas of a new data or metadata partition.
//! Four interchangeable policies share the [`NodeSelector`] contract:
//!
//! - [`RoundRobinNodeSelector`]: stable, id-ordered rotation with a
//!   persistent cursor; deterministic and audit-friendly.
//! - [`AvailableSpaceFirstNodeSelector`]: greedy by free capacity; responds
//!   fastest to imbalance on freshly expanded fleets.
//! - [`CarryWeightNodeSelector`]: per-node carry accumulators biased by
//!   normalized free capacity, so a node's long-run share of placements is
//!   proportional to its size while small nodes are never starved.
//! - [`StrawNodeSelector`]: Straw2 random draws weighted by free capacity;
//!   low variance and very stable under membership changes.
//!
//! Selectors operate on the [`NodeView`]/[`SelectableNode`] capability traits
//! and never touch cluster state directly; the node entities and the locking
//! coordinator live in `strata-cluster`. Every successful selection charges
//! each picked node exactly once via its `select_for_write` hook and
//! reshuffles the preference order before returning, so the primary replica
//! role is not always taken by the top-scoring node.
//!
//! # Example
//!
//! ```
//! use strata_core::NodeResourceType;
//! use strata_placement::testing::{SimNode, SimNodeSet};
//! use strata_placement::{new_node_selector, NodeSelector};
//!
//! let view = SimNodeSet::with_nodes(vec![
//!     SimNode::new(1, "10.0.0.1:17310", 100 << 30, 80 << 30),
//!     SimNode::new(2, "10.0.0.2:17310", 100 << 30, 60 << 30),
//!     SimNode::new(3, "10.0.0.3:17310", 100 << 30, 40 << 30),
//! ]);
//!
//! let selector = new_node_selector("AvailableSpaceFirst", NodeResourceType::DataDisk);
//! let selection = selector.select(&view, &[], 2).unwrap();
//! assert_eq!(selection.hosts.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod available_space;
pub mod carry_weight;
pub mod node;
pub mod round_robin;
pub mod selector;
pub mod shuffle;
pub mod straw;
pub mod testing;

pub use available_space::AvailableSpaceFirstNodeSelector;
pub use carry_weight::CarryWeightNodeSelector;
pub use node::{NodeView, SelectableNode};
pub use round_robin::RoundRobinNodeSelector;
pub use selector::{
    new_node_selector, NodeSelector, SelectError, Selection, AVAILABLE_SPACE_FIRST_SELECTOR_NAME,
    CARRY_WEIGHT_SELECTOR_NAME, DEFAULT_SELECTOR_NAME, ROUND_ROBIN_SELECTOR_NAME,
    STRAW_SELECTOR_NAME,
};
pub use shuffle::reshuffle_hosts;
pub use straw::StrawNodeSelector;
