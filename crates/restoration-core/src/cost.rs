use serde::{Deserialize, Serialize};

use crate::{Network, NodeId};

/// Surrogate cost-to-go of a damage configuration.
///
/// Every damaged node contributes `repair_time * (importance_ceiling -
/// importance)`, and every ordered (node, neighbor) pair with both ends
/// damaged adds `adjacency_penalty`. A damaged-damaged edge is therefore
/// charged once from each endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurrogateCost {
    pub importance_ceiling: f64,
    pub adjacency_penalty: f64,
}

impl Default for SurrogateCost {
    fn default() -> Self {
        Self {
            importance_ceiling: 10.0,
            adjacency_penalty: 5.0,
        }
    }
}

impl SurrogateCost {
    /// Cost of the network as it stands
    pub fn cost_to_go(&self, network: &Network) -> f64 {
        self.evaluate(network, None)
    }

    /// Cost as if `repaired` were already fixed, without touching the network
    pub fn cost_if_repaired(&self, network: &Network, repaired: NodeId) -> f64 {
        self.evaluate(network, Some(repaired))
    }

    fn evaluate(&self, network: &Network, overlay: Option<NodeId>) -> f64 {
        let damaged = |id: NodeId| Some(id) != overlay && network.node(id).is_damaged();

        let mut total = 0.0;
        for (id, node) in network.nodes().iter().enumerate() {
            if !damaged(id) {
                continue;
            }
            total += node.repair_time() * (self.importance_ceiling - node.importance() as f64);
            for &neighbor in network.neighbors(id) {
                if damaged(neighbor) {
                    total += self.adjacency_penalty;
                }
            }
        }
        total
    }
}
