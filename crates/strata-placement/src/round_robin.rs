//! Round-robin node selection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_core::NodeResourceType;
use tracing::debug;

use crate::node::{is_excluded, sorted_nodes, NodeView, SelectableNode};
use crate::selector::{
    commit_selection, NodeSelector, SelectError, Selection, ROUND_ROBIN_SELECTOR_NAME,
};

/// Stable, id-ordered rotation with a persistent cursor.
///
/// The candidate list is sorted by node id so the rotation stays stable as
/// membership changes slowly. The cursor advances by the number of nodes
/// *examined* during a call, not the number accepted; when many nodes are
/// skipped for non-writability the cursor jumps accordingly. A failed call
/// leaves the cursor untouched.
pub struct RoundRobinNodeSelector {
    resource: NodeResourceType,
    cursor: AtomicUsize,
}

impl RoundRobinNodeSelector {
    /// Creates a round-robin selector bound to one resource type.
    #[must_use]
    pub fn new(resource: NodeResourceType) -> Self {
        Self { resource, cursor: AtomicUsize::new(0) }
    }
}

impl NodeSelector for RoundRobinNodeSelector {
    fn name(&self) -> &'static str {
        ROUND_ROBIN_SELECTOR_NAME
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
        let nodes = sorted_nodes(view, self.resource);
        if nodes.len() < replica_num {
            return Err(SelectError::NoEnoughWritableHosts {
                replica_num,
                node_count: nodes.len(),
            });
        }

        let start = self.cursor.load(Ordering::Relaxed);
        let mut picked: Vec<Arc<dyn SelectableNode>> = Vec::with_capacity(replica_num);
        let mut examined = 0;
        // Scan forward from the cursor with wrap, touching each node at most
        // once per call.
        for offset in 0..nodes.len() {
            let node = &nodes[(start + offset) % nodes.len()];
            examined = offset + 1;
            if !node.is_writable(self.resource) {
                debug!(addr = %node.addr(), "round robin skipping non-writable node");
                continue;
            }
            if is_excluded(exclude_hosts, node.addr()) {
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
        self.cursor.fetch_add(examined, Ordering::Relaxed);
        commit_selection(self.name(), self.resource, &picked)
    }
}
