//! The selector contract and policy factory.

use std::sync::Arc;

use strata_core::{NodeResourceType, Peer};
use thiserror::Error;
use tracing::{info, warn};

use crate::available_space::AvailableSpaceFirstNodeSelector;
use crate::carry_weight::CarryWeightNodeSelector;
use crate::node::{NodeView, SelectableNode};
use crate::round_robin::RoundRobinNodeSelector;
use crate::shuffle::reshuffle_hosts;
use crate::straw::StrawNodeSelector;

/// Configuration name of the round-robin policy.
pub const ROUND_ROBIN_SELECTOR_NAME: &str = "RoundRobin";

/// Configuration name of the carry-weight policy.
pub const CARRY_WEIGHT_SELECTOR_NAME: &str = "CarryWeight";

/// Configuration name of the available-space-first policy.
pub const AVAILABLE_SPACE_FIRST_SELECTOR_NAME: &str = "AvailableSpaceFirst";

/// Configuration name of the straw policy.
pub const STRAW_SELECTOR_NAME: &str = "Straw";

/// Policy used when the configured name is unknown.
pub const DEFAULT_SELECTOR_NAME: &str = CARRY_WEIGHT_SELECTOR_NAME;

/// Errors that can occur during node selection.
#[derive(Debug, Error)]
pub enum SelectError {
    /// The node-set holds fewer nodes than the requested replica count.
    #[error("no enough hosts, replicaNum:{replica_num} matchNodeCount:{node_count}")]
    NoEnoughHosts {
        /// Requested replica count.
        replica_num: usize,
        /// Number of candidate nodes found.
        node_count: usize,
    },

    /// Fewer writable, non-excluded nodes than the requested replica count.
    #[error("no enough writable hosts, replicaNum:{replica_num} matchNodeCount:{node_count}")]
    NoEnoughWritableHosts {
        /// Requested replica count.
        replica_num: usize,
        /// Number of writable candidates found.
        node_count: usize,
    },

    /// Reshuffle was handed an empty host list.
    #[error("reshuffle failed: empty host list")]
    EmptyReshuffle,
}

/// A successful placement: the replica host list and the matching peers.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Chosen host addresses, reshuffled so the primary role rotates.
    pub hosts: Vec<String>,
    /// Peer records (`id` + `addr`) in the selector's preference order.
    pub peers: Vec<Peer>,
}

impl Selection {
    /// The empty selection returned for `replica_num == 0`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Common contract of the four placement policies.
///
/// A selector instance is bound to one [`NodeResourceType`] at construction
/// and may keep policy-local state across calls (cursor, carry map, rng).
/// Callers must serialize `select` invocations per node-set; the selectors
/// themselves only guard their own state.
pub trait NodeSelector: Send + Sync {
    /// Identifier for logs and configuration.
    fn name(&self) -> &'static str;

    /// Pick `replica_num` distinct writable nodes not in `exclude_hosts`.
    ///
    /// Returns the reshuffled host list and the peers, or an error if the
    /// fleet cannot satisfy the request. Charging is all-or-nothing: on the
    /// error path no node's `select_for_write` hook has fired.
    ///
    /// # Errors
    ///
    /// [`SelectError::NoEnoughHosts`] or
    /// [`SelectError::NoEnoughWritableHosts`] when fewer than `replica_num`
    /// candidates survive filtering.
    fn select(
        &self,
        view: &dyn NodeView,
        exclude_hosts: &[String],
        replica_num: usize,
    ) -> Result<Selection, SelectError>;

    /// Drops policy state kept for a node that left the node-set.
    ///
    /// The default does nothing; stateful policies override it.
    fn forget_node(&self, _id: u64) {}
}

/// Builds the selector registered under `name` for the given resource type.
///
/// Unknown names fall back to the [`CarryWeightNodeSelector`] default.
#[must_use]
pub fn new_node_selector(name: &str, resource: NodeResourceType) -> Box<dyn NodeSelector> {
    match name {
        ROUND_ROBIN_SELECTOR_NAME => Box::new(RoundRobinNodeSelector::new(resource)),
        CARRY_WEIGHT_SELECTOR_NAME => Box::new(CarryWeightNodeSelector::new(resource)),
        AVAILABLE_SPACE_FIRST_SELECTOR_NAME => {
            Box::new(AvailableSpaceFirstNodeSelector::new(resource))
        }
        STRAW_SELECTOR_NAME => Box::new(StrawNodeSelector::new(resource)),
        other => {
            warn!(name = %other, "unknown node selector name, falling back to CarryWeight");
            Box::new(CarryWeightNodeSelector::new(resource))
        }
    }
}

/// Charge the picked nodes and produce the final [`Selection`].
///
/// This is the single point where side effects happen: callers only reach it
/// once the pick list is complete, which keeps charging all-or-nothing.
pub(crate) fn commit_selection(
    name: &str,
    resource: NodeResourceType,
    picked: &[Arc<dyn SelectableNode>],
) -> Result<Selection, SelectError> {
    let mut order_hosts = Vec::with_capacity(picked.len());
    let mut peers = Vec::with_capacity(picked.len());
    for node in picked {
        node.select_for_write(resource);
        order_hosts.push(node.addr().to_string());
        peers.push(Peer { id: node.id(), addr: node.addr().to_string() });
    }
    info!(selector = name, peers = ?peers, "selected hosts");
    let hosts = reshuffle_hosts(order_hosts)?;
    Ok(Selection { hosts, peers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{SimNode, SimNodeSet};

    #[test]
    fn test_factory_names() {
        let resource = NodeResourceType::DataDisk;
        assert_eq!(new_node_selector("RoundRobin", resource).name(), ROUND_ROBIN_SELECTOR_NAME);
        assert_eq!(new_node_selector("CarryWeight", resource).name(), CARRY_WEIGHT_SELECTOR_NAME);
        assert_eq!(
            new_node_selector("AvailableSpaceFirst", resource).name(),
            AVAILABLE_SPACE_FIRST_SELECTOR_NAME
        );
        assert_eq!(new_node_selector("Straw", resource).name(), STRAW_SELECTOR_NAME);
    }

    #[test]
    fn test_factory_unknown_name_falls_back() {
        let selector = new_node_selector("NoSuchPolicy", NodeResourceType::MetaMemory);
        assert_eq!(selector.name(), DEFAULT_SELECTOR_NAME);
    }

    #[test]
    fn test_zero_replicas_is_empty_for_every_policy() {
        let view = SimNodeSet::with_nodes(vec![SimNode::new(1, "10.0.0.1:17310", 100, 50)]);
        for name in ["RoundRobin", "CarryWeight", "AvailableSpaceFirst", "Straw"] {
            let selector = new_node_selector(name, NodeResourceType::DataDisk);
            let selection = selector.select(&view, &[], 0).unwrap();
            assert!(selection.hosts.is_empty(), "{name} returned hosts for n=0");
            assert!(selection.peers.is_empty(), "{name} returned peers for n=0");
        }
    }

    #[test]
    fn test_error_messages() {
        let err = SelectError::NoEnoughWritableHosts { replica_num: 3, node_count: 1 };
        assert_eq!(err.to_string(), "no enough writable hosts, replicaNum:3 matchNodeCount:1");
        let err = SelectError::NoEnoughHosts { replica_num: 2, node_count: 0 };
        assert_eq!(err.to_string(), "no enough hosts, replicaNum:2 matchNodeCount:0");
    }
}
