use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Network, Result, RolloutConfig, RolloutOutcome, RolloutScheduler, SeededSource};

/// How many independent rollouts to run and how to seed them
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSpec {
    pub replications: usize,
    pub global_seed: u64,
    pub use_parallel: bool,
}

impl EnsembleSpec {
    pub fn new(replications: usize, global_seed: u64) -> Self {
        Self {
            replications,
            global_seed,
            use_parallel: true,
        }
    }
}

/// Outcomes of repeated rollouts from the same initial network
#[derive(Clone, Debug)]
pub struct Ensemble {
    pub outcomes: Vec<RolloutOutcome>,
    pub spec: EnsembleSpec,
    /// Registry names of the template network, indexed by `NodeId`
    pub node_names: Vec<String>,
}

/// How often a node was repaired across replications
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeFrequency {
    pub name: String,
    /// Fraction of replications that committed this node at all
    pub committed: f64,
    /// Fraction of replications that committed this node first
    pub first: f64,
}

/// Statistical summary of an ensemble
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub replications: usize,
    pub mean_restoration_time: f64,
    pub var_restoration_time: f64,
    pub mean_population_restored: f64,
    pub var_population_restored: f64,
    pub mean_actions: f64,
    pub mean_failed_attempts: f64,
    pub nodes: Vec<NodeFrequency>,
}

/// Run `spec.replications` rollouts, each on its own copy of `network`
/// with the stream `SeededSource::from_replication(global_seed, i)`.
///
/// Results are in replication order and do not depend on thread count.
pub fn run_replications(
    network: &Network,
    config: &RolloutConfig,
    spec: EnsembleSpec,
) -> Result<Ensemble> {
    config.validate()?;

    let run_one = |replication: usize| -> Result<RolloutOutcome> {
        let rng = SeededSource::from_replication(spec.global_seed, replication as u64);
        let mut scheduler = RolloutScheduler::new(config.clone(), rng)?;
        let mut copy = network.clone();
        Ok(scheduler.run_with(&mut copy, |_| {}))
    };

    let outcomes = if spec.use_parallel {
        (0..spec.replications).into_par_iter().map(run_one).collect::<Result<Vec<_>>>()?
    } else {
        (0..spec.replications).map(run_one).collect::<Result<Vec<_>>>()?
    };

    let node_names = network.nodes().iter().map(|node| node.name().to_string()).collect();
    Ok(Ensemble {
        outcomes,
        spec,
        node_names,
    })
}

impl Ensemble {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn summary(&self) -> EnsembleSummary {
        let n = self.len();
        let times: Vec<f64> = self.outcomes.iter().map(|o| o.total_restoration_time).collect();
        let populations: Vec<f64> = self
            .outcomes
            .iter()
            .map(|o| o.total_population_restored as f64)
            .collect();
        let actions: Vec<f64> = self.outcomes.iter().map(|o| o.actions.len() as f64).collect();
        let failed: Vec<f64> = self.outcomes.iter().map(|o| o.failed_attempts as f64).collect();

        let mut committed = vec![0usize; self.node_names.len()];
        let mut first = vec![0usize; self.node_names.len()];
        for outcome in &self.outcomes {
            for &node in &outcome.actions {
                committed[node] += 1;
            }
            if let Some(&node) = outcome.actions.first() {
                first[node] += 1;
            }
        }

        let fraction = |count: usize| if n == 0 { 0.0 } else { count as f64 / n as f64 };
        let nodes = self
            .node_names
            .iter()
            .enumerate()
            .map(|(id, name)| NodeFrequency {
                name: name.clone(),
                committed: fraction(committed[id]),
                first: fraction(first[id]),
            })
            .collect();

        EnsembleSummary {
            replications: n,
            mean_restoration_time: mean(&times),
            var_restoration_time: variance(&times),
            mean_population_restored: mean(&populations),
            var_population_restored: variance(&populations),
            mean_actions: mean(&actions),
            mean_failed_attempts: mean(&failed),
            nodes,
        }
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

fn variance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1).max(1) as f64
}
