use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Why a rollout stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No damaged node left to consider
    NoDamage,
    /// All epochs in the step budget were used
    StepBudgetExhausted,
}

/// Decision trace of one rollout, in emission order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RolloutEvent {
    EpochStarted {
        epoch: usize,
        candidates: Vec<NodeId>,
    },
    DelayApplied {
        epoch: usize,
        node: NodeId,
        factor: f64,
        repair_time: f64,
    },
    /// The probabilistic repair attempt failed; the candidate sits out this epoch
    RepairFailed {
        epoch: usize,
        node: NodeId,
    },
    CandidateEvaluated {
        epoch: usize,
        node: NodeId,
        cost: f64,
    },
    RepairCommitted {
        epoch: usize,
        node: NodeId,
        repair_time: f64,
        population_served: u64,
        cost: f64,
    },
    DamagePropagated {
        epoch: usize,
        from: NodeId,
        to: NodeId,
    },
    /// Every candidate failed; nothing committed
    EpochIdle {
        epoch: usize,
    },
    EpochClosed {
        epoch: usize,
        total_restoration_time: f64,
        total_population_restored: u64,
    },
    Finished {
        epochs: usize,
        reason: StopReason,
    },
}

impl RolloutEvent {
    pub fn epoch(&self) -> Option<usize> {
        match self {
            RolloutEvent::EpochStarted { epoch, .. }
            | RolloutEvent::DelayApplied { epoch, .. }
            | RolloutEvent::RepairFailed { epoch, .. }
            | RolloutEvent::CandidateEvaluated { epoch, .. }
            | RolloutEvent::RepairCommitted { epoch, .. }
            | RolloutEvent::DamagePropagated { epoch, .. }
            | RolloutEvent::EpochIdle { epoch }
            | RolloutEvent::EpochClosed { epoch, .. } => Some(*epoch),
            RolloutEvent::Finished { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json() {
        let event = RolloutEvent::RepairFailed { epoch: 2, node: 7 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "repair_failed");
        assert_eq!(json["node"], 7);

        let finished = RolloutEvent::Finished { epochs: 3, reason: StopReason::NoDamage };
        let json = serde_json::to_string(&finished).unwrap();
        assert!(json.contains("\"reason\":\"no_damage\""));
        let back: RolloutEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, finished);
        assert_eq!(back.epoch(), None);
    }
}
