//! Greedy selection by free capacity.

use std::sync::Arc;

use strata_core::NodeResourceType;

use crate::node::{is_excluded, sorted_nodes, NodeView, SelectableNode};
use crate::selector::{
    commit_selection, NodeSelector, SelectError, Selection, AVAILABLE_SPACE_FIRST_SELECTOR_NAME,
};

/// Picks the emptiest nodes first.
///
/// The simplest policy that responds to imbalance: sort by free capacity
/// descending and take the writable, non-excluded top. Equal free capacities
/// break ties by node id ascending so repeated calls are deterministic.
/// Stateless.
pub struct AvailableSpaceFirstNodeSelector {
    resource: NodeResourceType,
}

impl AvailableSpaceFirstNodeSelector {
    /// Creates an available-space-first selector bound to one resource type.
    #[must_use]
    pub fn new(resource: NodeResourceType) -> Self {
        Self { resource }
    }
}

impl NodeSelector for AvailableSpaceFirstNodeSelector {
    fn name(&self) -> &'static str {
        AVAILABLE_SPACE_FIRST_SELECTOR_NAME
    }

    fn select(
        &self,
        view: &dyn NodeView,
        exclude_hosts: &[String],
        replica_num: usize,
    ) -> Result<Selection, SelectError> {
        if replica_num == 0 {
            return Ok(Selection::empty());
        }
        let mut nodes = sorted_nodes(view, self.resource);
        if nodes.len() < replica_num {
            return Err(SelectError::NoEnoughHosts { replica_num, node_count: nodes.len() });
        }
        // Stable sort on the id-ordered snapshot: ties fall back to id order.
        nodes.sort_by(|a, b| {
            b.free_capacity(self.resource).cmp(&a.free_capacity(self.resource))
        });

        let mut picked: Vec<Arc<dyn SelectableNode>> = Vec::with_capacity(replica_num);
        for node in &nodes {
            if !node.is_writable(self.resource) || is_excluded(exclude_hosts, node.addr()) {
                continue;
            }
            picked.push(Arc::clone(node));
            if picked.len() == replica_num {
                break;
            }
        }

        if picked.len() < replica_num {
            return Err(SelectError::NoEnoughWritableHosts {
                replica_num,
                node_count: picked.len(),
            });
        }
        commit_selection(self.name(), self.resource, &picked)
    }
}
