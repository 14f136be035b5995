use crate::{Network, NodeId};

/// Base policy proposing which damaged nodes the rollout should consider
pub trait CandidateHeuristic {
    /// At most `budget` damaged nodes, most urgent first. Must not mutate.
    fn candidates(&self, network: &Network, budget: usize) -> Vec<NodeId>;
}

/// Ranks damaged nodes by importance, highest first; ties keep registry order
#[derive(Clone, Copy, Debug, Default)]
pub struct ImportanceHeuristic;

impl CandidateHeuristic for ImportanceHeuristic {
    fn candidates(&self, network: &Network, budget: usize) -> Vec<NodeId> {
        let mut damaged = network.damaged_nodes();
        // sort_by is stable
        damaged.sort_by(|&a, &b| {
            network.node(b).importance().cmp(&network.node(a).importance())
        });
        damaged.truncate(budget);
        damaged
    }
}
