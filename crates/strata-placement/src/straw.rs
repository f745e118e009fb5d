//! Straw2 node selection.
//!
//! # Algorithm
//!
//! Every candidate draws a straw
//!
//! ```text
//! r     ~ uniform integer in [0, 65536)
//! straw = ln(r / 65536) / w
//! ```
//!
//! where `w` is the candidate's free capacity in gibibytes. The logarithm is
//! never positive and `w` is positive, so straws are at most zero and the
//! node with the largest straw (closest to zero) wins the round; bigger
//! nodes divide by a larger `w` and win more often. Candidates with zero
//! weight are dropped before any straw is drawn. Writability is checked only
//! after a round is won, so the draws reflect the whole fleet rather than
//! the currently-writable subset.
//!
//! This is the Straw2 bucket rule popularized by Ceph's CRUSH: per-call
//! stateless, low variance, and removing one candidate disturbs at most one
//! position of the outcome.
//!
//! # Reference
//!
//! Weil, S., Brandt, S., Miller, E., & Maltzahn, C. (2006).
//! "CRUSH: Controlled, Scalable, Decentralized Placement of Replicated Data"

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strata_core::units::GB;
use strata_core::NodeResourceType;
use tracing::debug;

use crate::node::{is_excluded, sorted_nodes, NodeView, SelectableNode};
use crate::selector::{
    commit_selection, NodeSelector, SelectError, Selection, STRAW_SELECTOR_NAME,
};

/// Exclusive upper bound of the uniform draw.
const STRAW_RAND_MAX: u64 = 65536;

/// Straw2 selection weighted by free capacity.
///
/// Each selector owns its rng, seeded from the wall clock at construction so
/// selectors on the same host diverge; [`StrawNodeSelector::with_seed`]
/// pins the seed for reproducible tests.
pub struct StrawNodeSelector {
    resource: NodeResourceType,
    rng: Mutex<StdRng>,
}

impl StrawNodeSelector {
    /// Creates a straw selector bound to one resource type.
    #[must_use]
    pub fn new(resource: NodeResourceType) -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_micros() as u64)
            .unwrap_or_default();
        Self::with_seed(resource, micros)
    }

    /// Creates a straw selector with a fixed rng seed.
    #[must_use]
    pub fn with_seed(resource: NodeResourceType, seed: u64) -> Self {
        Self { resource, rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    /// Free capacity in gibibytes.
    fn weight(&self, node: &dyn SelectableNode) -> f64 {
        node.free_capacity(self.resource) as f64 / GB as f64
    }

    /// Draws one straw per candidate and returns the index of the winner.
    fn draw_round(&self, rng: &mut StdRng, nodes: &[Arc<dyn SelectableNode>]) -> Option<usize> {
        let mut max_straw = 0.0;
        let mut winner = None;
        for (index, node) in nodes.iter().enumerate() {
            let r = rng.gen_range(0..STRAW_RAND_MAX) as f64;
            let straw = (r / STRAW_RAND_MAX as f64).ln() / self.weight(node.as_ref());
            if winner.is_none() || straw > max_straw {
                max_straw = straw;
                winner = Some(index);
            }
        }
        winner
    }
}

impl NodeSelector for StrawNodeSelector {
    fn name(&self) -> &'static str {
        STRAW_SELECTOR_NAME
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
        let mut candidates: Vec<Arc<dyn SelectableNode>> = sorted_nodes(view, self.resource)
            .into_iter()
            .filter(|node| !is_excluded(exclude_hosts, node.addr()))
            .filter(|node| {
                let has_weight = node.free_capacity(self.resource) > 0;
                if !has_weight {
                    debug!(addr = %node.addr(), "straw dropping zero-weight node");
                }
                has_weight
            })
            .collect();

        let mut picked: Vec<Arc<dyn SelectableNode>> = Vec::with_capacity(replica_num);
        let mut rng = self.rng.lock();
        while picked.len() < replica_num {
            if candidates.len() + picked.len() < replica_num {
                break;
            }
            let Some(winner) = self.draw_round(&mut rng, &candidates) else {
                break;
            };
            let node = candidates.swap_remove(winner);
            if !node.is_writable(self.resource) {
                debug!(addr = %node.addr(), "straw discarding non-writable winner");
                continue;
            }
            picked.push(node);
        }
        drop(rng);

        if picked.len() < replica_num {
            return Err(SelectError::NoEnoughWritableHosts {
                replica_num,
                node_count: picked.len(),
            });
        }
        commit_selection(self.name(), self.resource, &picked)
    }
}
