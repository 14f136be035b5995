use serde::{Deserialize, Serialize};

use crate::{Network, NodeId, RandomSource, RestoreError, Result};

/// Multiplicative repair-time perturbation drawn from [low, high).
///
/// The range is validated on construction and on deserialization, so
/// `apply` always samples from a non-empty positive interval.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DelayRange")]
pub struct RepairDelay {
    low: f64,
    high: f64,
}

#[derive(Deserialize)]
struct DelayRange {
    low: f64,
    high: f64,
}

impl TryFrom<DelayRange> for RepairDelay {
    type Error = RestoreError;

    fn try_from(range: DelayRange) -> Result<Self> {
        Self::new(range.low, range.high)
    }
}

impl Default for RepairDelay {
    fn default() -> Self {
        Self { low: 0.8, high: 1.5 }
    }
}

impl RepairDelay {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        let delay = Self { low, high };
        delay.validate()?;
        Ok(delay)
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn validate(&self) -> Result<()> {
        let finite = self.low.is_finite() && self.high.is_finite();
        let ok = finite && self.low > 0.0 && self.low < self.high;
        if ok {
            Ok(())
        } else {
            Err(RestoreError::InvalidDelayRange { low: self.low, high: self.high })
        }
    }

    /// Redraw the repair time of `node` as `base_repair_time * factor`.
    ///
    /// Each call overwrites the previous draw; delays never compound.
    /// Returns the drawn factor.
    pub fn apply<R: RandomSource>(&self, network: &mut Network, node: NodeId, rng: &mut R) -> f64 {
        let factor = rng.uniform(self.low, self.high);
        let base = network.node(node).base_repair_time();
        network.set_repair_time(node, base * factor);
        factor
    }
}
