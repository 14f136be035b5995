//! Rollout scheduling of repairs on a damaged infrastructure network.
//!
//! One epoch asks the heuristic for candidates, draws a repair delay and a
//! success trial per candidate, scores each successful candidate with the
//! surrogate cost-to-go, commits the cheapest one and lets damage cascade
//! from it to its neighbors.

pub mod error;
pub mod network;
pub mod rng;
pub mod delay;
pub mod propagation;
pub mod heuristic;
pub mod cost;
pub mod events;
pub mod rollout;
pub mod ensemble;

pub use error::{RestoreError, Result};
pub use network::{DamageState, Network, Node, NodeRecord, NodeView};
pub use rng::{RandomSource, ReplaySource, SeededSource};
pub use delay::RepairDelay;
pub use propagation::DamagePropagation;
pub use heuristic::{CandidateHeuristic, ImportanceHeuristic};
pub use cost::SurrogateCost;
pub use events::{RolloutEvent, StopReason};
pub use rollout::{RolloutConfig, RolloutOutcome, RolloutScheduler};
pub use ensemble::{run_replications, Ensemble, EnsembleSpec, EnsembleSummary, NodeFrequency};

/// Index of a node in the registry (insertion order).
pub type NodeId = usize;
