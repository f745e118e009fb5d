//! Carry-weight node selection.
//!
//! # Algorithm
//!
//! Every node carries a floating-point accumulator seeded from its free
//! capacity normalized by the largest *total* capacity in the fleet. A node
//! is available once its carry reaches `1.0`; while fewer than `replica_num`
//! candidates are available, every candidate's carry is advanced by its
//! weight (free capacity over max total), clamped at [`MAX_CARRY`]. The top
//! `replica_num` candidates by carry win, and each winner's carry is drained
//! by `1.0`.
//!
//! The effect is the CRUSH-straw idea in accumulator form: a node's long-run
//! share of placements is proportional to its capacity, yet a temporarily
//! underweight node keeps accumulating pressure and is guaranteed to be
//! picked eventually, even when slightly larger rivals are always available.
//! Draining by a full unit may push a carry negative; that is correct and
//! lets large nodes win again soon.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use strata_core::NodeResourceType;
use tracing::debug;

use crate::node::{is_excluded, sorted_nodes, NodeView, SelectableNode};
use crate::selector::{
    commit_selection, NodeSelector, SelectError, Selection, CARRY_WEIGHT_SELECTOR_NAME,
};

/// Carry ceiling. Without it a never-chosen huge node would accumulate
/// unbounded bias and then monopolize many future placements.
const MAX_CARRY: f64 = 10.0;

struct WeightedNode {
    carry: f64,
    weight: f64,
    id: u64,
    node: Arc<dyn SelectableNode>,
}

/// Capacity-proportional selection with per-node carry accumulators.
///
/// Carries are retained across calls and initialized lazily the first time a
/// node is seen; [`NodeSelector::forget_node`] prunes entries for nodes that
/// left the node-set. Candidates are always iterated in id order, so two
/// selectors fed identical state produce identical picks.
pub struct CarryWeightNodeSelector {
    resource: NodeResourceType,
    carry: Mutex<HashMap<u64, f64>>,
}

impl CarryWeightNodeSelector {
    /// Creates a carry-weight selector bound to one resource type.
    #[must_use]
    pub fn new(resource: NodeResourceType) -> Self {
        Self { resource, carry: Mutex::new(HashMap::new()) }
    }

    fn ratio(part: u64, max_total: u64) -> f64 {
        if max_total == 0 {
            0.0
        } else {
            part as f64 / max_total as f64
        }
    }

    #[cfg(test)]
    fn carry_of(&self, id: u64) -> Option<f64> {
        self.carry.lock().get(&id).copied()
    }
}

impl NodeSelector for CarryWeightNodeSelector {
    fn name(&self) -> &'static str {
        CARRY_WEIGHT_SELECTOR_NAME
    }

    fn select(
        &self,
        view: &dyn NodeView,
        exclude_hosts: &[String],
        replica_num: usize,
    ) -> Result<Selection, SelectError> {
        let nodes = sorted_nodes(view, self.resource);
        // Normalize by the largest total capacity, not available space, so
        // small nodes do not get outsized weights.
        let max_total =
            nodes.iter().map(|node| node.total_capacity(self.resource)).max().unwrap_or(0);

        let mut carry = self.carry.lock();
        for node in &nodes {
            carry
                .entry(node.id())
                .or_insert_with(|| Self::ratio(node.free_capacity(self.resource), max_total));
        }
        if replica_num == 0 {
            return Ok(Selection::empty());
        }

        let mut tabs: Vec<WeightedNode> = Vec::new();
        let mut avail_count = 0;
        for node in &nodes {
            if is_excluded(exclude_hosts, node.addr()) {
                debug!(addr = %node.addr(), "carry weight skipping excluded node");
                continue;
            }
            if !node.is_writable(self.resource) {
                debug!(addr = %node.addr(), "carry weight skipping non-writable node");
                continue;
            }
            let node_carry = carry.get(&node.id()).copied().unwrap_or_default();
            if node_carry >= 1.0 {
                avail_count += 1;
            }
            tabs.push(WeightedNode {
                carry: node_carry,
                weight: Self::ratio(node.free_capacity(self.resource), max_total),
                id: node.id(),
                node: Arc::clone(node),
            });
        }
        if tabs.len() < replica_num {
            return Err(SelectError::NoEnoughWritableHosts {
                replica_num,
                node_count: tabs.len(),
            });
        }

        // Advance every candidate until enough of them carry at least a full
        // unit. Writable nodes always have positive weight, so this
        // terminates.
        while avail_count < replica_num {
            avail_count = 0;
            for tab in &mut tabs {
                let advanced = (tab.carry + tab.weight).min(MAX_CARRY);
                tab.carry = advanced;
                carry.insert(tab.id, advanced);
                if advanced > 1.0 {
                    avail_count += 1;
                }
            }
        }

        // Stable sort over the id-ordered list: equal carries keep id order.
        tabs.sort_by(|a, b| b.carry.partial_cmp(&a.carry).unwrap_or(Ordering::Equal));

        let picked: Vec<Arc<dyn SelectableNode>> =
            tabs[..replica_num].iter().map(|tab| Arc::clone(&tab.node)).collect();
        for tab in &tabs[..replica_num] {
            *carry.entry(tab.id).or_insert(tab.carry) -= 1.0;
        }
        drop(carry);
        commit_selection(self.name(), self.resource, &picked)
    }

    fn forget_node(&self, id: u64) {
        self.carry.lock().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::testing::{SimNode, SimNodeSet};

    const GB: u64 = 1 << 30;

    fn host_set(selection: &Selection) -> HashSet<String> {
        selection.hosts.iter().cloned().collect()
    }

    #[test]
    fn test_share_is_proportional_to_capacity() {
        // Totals 1000/500 GiB, free 500/250 GiB, n=1, static fleet: node 1
        // should take roughly two thirds of 1000 placements.
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 1000 * GB, 500 * GB),
            SimNode::new(2, "10.0.0.2:17310", 500 * GB, 250 * GB),
        ]);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        let mut first_node_picks = 0;
        for _ in 0..1000 {
            let selection = selector.select(&view, &[], 1).unwrap();
            if selection.hosts[0] == "10.0.0.1:17310" {
                first_node_picks += 1;
            }
        }
        assert!(
            (637..=697).contains(&first_node_picks),
            "expected ~667 picks for the large node, got {first_node_picks}"
        );
    }

    #[test]
    fn test_carry_is_drained_on_pick() {
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 100 * GB, 80 * GB),
            SimNode::new(2, "10.0.0.2:17310", 100 * GB, 40 * GB),
        ]);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        let selection = selector.select(&view, &[], 1).unwrap();
        let picked_id = selection.peers[0].id;
        let after = selector.carry_of(picked_id).unwrap();
        // The winner crossed 1.0 during advancement and was then drained by a
        // full unit.
        assert!(after < 1.0, "picked node still carries {after}");
    }

    #[test]
    fn test_carry_never_exceeds_ceiling() {
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 100 * GB, 100 * GB),
            SimNode::new(2, "10.0.0.2:17310", 100 * GB, 1 * GB),
            SimNode::new(3, "10.0.0.3:17310", 100 * GB, 1 * GB),
        ]);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        for _ in 0..500 {
            selector.select(&view, &[], 1).unwrap();
            for id in 1..=3 {
                let carry = selector.carry_of(id).unwrap();
                assert!(carry <= MAX_CARRY, "carry of node {id} is {carry}");
            }
        }
    }

    #[test]
    fn test_deterministic_given_identical_state() {
        let fleet = || {
            SimNodeSet::with_nodes(vec![
                SimNode::new(1, "10.0.0.1:17310", 400 * GB, 300 * GB),
                SimNode::new(2, "10.0.0.2:17310", 300 * GB, 150 * GB),
                SimNode::new(3, "10.0.0.3:17310", 200 * GB, 180 * GB),
                SimNode::new(4, "10.0.0.4:17310", 100 * GB, 20 * GB),
            ])
        };
        let left_view = fleet();
        let right_view = fleet();
        let left = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);
        let right = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        for _ in 0..20 {
            // Peers preserve the preference order, so they must match exactly.
            let left_peers = left.select(&left_view, &[], 2).unwrap().peers;
            let right_peers = right.select(&right_view, &[], 2).unwrap().peers;
            assert_eq!(left_peers, right_peers);
        }
    }

    #[test]
    fn test_excluded_and_unwritable_are_skipped() {
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 100 * GB, 90 * GB),
            SimNode::new(2, "10.0.0.2:17310", 100 * GB, 90 * GB),
            SimNode::new(3, "10.0.0.3:17310", 100 * GB, 90 * GB),
            SimNode::new(4, "10.0.0.4:17310", 100 * GB, 90 * GB),
        ]);
        view.sim_nodes()[2].set_writable(false);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        let excluded = vec!["10.0.0.1:17310".to_string()];
        let selection = selector.select(&view, &excluded, 2).unwrap();
        assert_eq!(
            host_set(&selection),
            HashSet::from(["10.0.0.2:17310".to_string(), "10.0.0.4:17310".to_string()])
        );
    }

    #[test]
    fn test_shortfall_charges_nothing_and_keeps_carry() {
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 100 * GB, 50 * GB),
            SimNode::new(2, "10.0.0.2:17310", 100 * GB, 50 * GB),
        ]);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        let err = selector.select(&view, &[], 3).unwrap_err();
        assert!(matches!(
            err,
            SelectError::NoEnoughWritableHosts { replica_num: 3, node_count: 2 }
        ));
        for node in view.sim_nodes() {
            assert_eq!(node.total_write_count(), 0);
        }
        // Carries were seeded but not advanced or drained.
        assert_eq!(selector.carry_of(1), Some(0.5));
        assert_eq!(selector.carry_of(2), Some(0.5));
    }

    #[test]
    fn test_successful_call_charges_each_winner_once() {
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 100 * GB, 60 * GB),
            SimNode::new(2, "10.0.0.2:17310", 100 * GB, 60 * GB),
            SimNode::new(3, "10.0.0.3:17310", 100 * GB, 60 * GB),
        ]);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);

        let selection = selector.select(&view, &[], 2).unwrap();
        assert_eq!(selection.hosts.len(), 2);
        let charged: u64 =
            view.sim_nodes().iter().map(|node| node.write_count(NodeResourceType::DataDisk)).sum();
        assert_eq!(charged, 2);
    }

    #[test]
    fn test_forget_node_prunes_carry() {
        let view = SimNodeSet::with_nodes(vec![
            SimNode::new(1, "10.0.0.1:17310", 100 * GB, 50 * GB),
            SimNode::new(2, "10.0.0.2:17310", 100 * GB, 50 * GB),
        ]);
        let selector = CarryWeightNodeSelector::new(NodeResourceType::DataDisk);
        selector.select(&view, &[], 1).unwrap();
        assert!(selector.carry_of(1).is_some());

        selector.forget_node(1);
        assert!(selector.carry_of(1).is_none());
        // The next call reseeds the departed node lazily.
        selector.select(&view, &[], 1).unwrap();
        assert!(selector.carry_of(1).is_some());
    }
}
