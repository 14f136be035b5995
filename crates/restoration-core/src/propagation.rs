use serde::{Deserialize, Serialize};

use crate::{Network, NodeId, RandomSource, RestoreError, Result};

/// Cascading damage from a freshly repaired node to its neighbors
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DamagePropagation {
    pub probability: f64,
}

impl Default for DamagePropagation {
    fn default() -> Self {
        Self { probability: 0.2 }
    }
}

impl DamagePropagation {
    pub fn new(probability: f64) -> Result<Self> {
        let model = Self { probability };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if (0.0..=1.0).contains(&self.probability) {
            Ok(())
        } else {
            Err(RestoreError::InvalidProbability {
                name: "propagation probability",
                value: self.probability,
            })
        }
    }

    /// Spread damage from `source` to its neighbors.
    ///
    /// Neighbors that are damaged or permanently repaired are skipped
    /// without consuming a draw. Every other neighbor gets exactly one draw,
    /// in name order, and becomes damaged when it falls below the
    /// probability. Returns the newly damaged nodes.
    pub fn propagate<R: RandomSource>(
        &self,
        network: &mut Network,
        source: NodeId,
        rng: &mut R,
    ) -> Vec<NodeId> {
        let neighbors = network.neighbors(source).to_vec();
        let mut hit = Vec::new();

        for neighbor in neighbors {
            let node = network.node(neighbor);
            if node.is_damaged() || node.is_repaired() {
                continue;
            }
            if rng.chance(self.probability) && network.mark_damaged(neighbor) {
                hit.push(neighbor);
            }
        }

        hit
    }
}
