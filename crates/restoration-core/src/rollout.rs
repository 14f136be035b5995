use serde::{Deserialize, Serialize};

use crate::{
    CandidateHeuristic, DamagePropagation, ImportanceHeuristic, Network, NodeId, RandomSource,
    RepairDelay, RestoreError, Result, RolloutEvent, SeededSource, StopReason, SurrogateCost,
};

/// Run parameters and model constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Candidates considered per epoch (not repairs per epoch)
    pub available_resources: usize,
    /// Epoch budget
    pub steps: usize,
    pub success_probability: f64,
    pub delay: RepairDelay,
    pub propagation: DamagePropagation,
    pub cost: SurrogateCost,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            available_resources: 5,
            steps: 5,
            success_probability: 0.8,
            delay: RepairDelay::default(),
            propagation: DamagePropagation::default(),
            cost: SurrogateCost::default(),
        }
    }
}

impl RolloutConfig {
    pub fn new(available_resources: usize, steps: usize) -> Self {
        Self {
            available_resources,
            steps,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.available_resources == 0 {
            return Err(RestoreError::InvalidResourceBudget(self.available_resources));
        }
        if self.steps == 0 {
            return Err(RestoreError::InvalidStepCount(self.steps));
        }
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(RestoreError::InvalidProbability {
                name: "repair success probability",
                value: self.success_probability,
            });
        }
        self.delay.validate()?;
        self.propagation.validate()
    }
}

/// Result of one rollout run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RolloutOutcome {
    /// Committed repairs in order
    pub actions: Vec<NodeId>,
    pub action_names: Vec<String>,
    /// Sum of repair times at the instant of each commit
    pub total_restoration_time: f64,
    pub total_population_restored: u64,
    pub failed_attempts: usize,
    /// Epochs that ran the decision step
    pub epochs: usize,
    pub stop_reason: StopReason,
    pub events: Vec<RolloutEvent>,
}

impl RolloutOutcome {
    fn empty() -> Self {
        Self {
            actions: Vec::new(),
            action_names: Vec::new(),
            total_restoration_time: 0.0,
            total_population_restored: 0,
            failed_attempts: 0,
            epochs: 0,
            stop_reason: StopReason::StepBudgetExhausted,
            events: Vec::new(),
        }
    }
}

/// One-step lookahead repair scheduler.
///
/// Owns the random source for the whole run; the delay model, the success
/// trial and propagation all draw from it in a fixed order.
pub struct RolloutScheduler<R, H = ImportanceHeuristic> {
    config: RolloutConfig,
    heuristic: H,
    rng: R,
}

impl RolloutScheduler<SeededSource> {
    pub fn seeded(config: RolloutConfig, seed: u64) -> Result<Self> {
        Self::new(config, SeededSource::new(seed))
    }
}

impl<R: RandomSource> RolloutScheduler<R> {
    pub fn new(config: RolloutConfig, rng: R) -> Result<Self> {
        Self::with_heuristic(config, ImportanceHeuristic, rng)
    }
}

impl<R: RandomSource, H: CandidateHeuristic> RolloutScheduler<R, H> {
    /// Rejects zero budgets, zero step counts and out-of-range constants
    pub fn with_heuristic(config: RolloutConfig, heuristic: H, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, heuristic, rng })
    }

    /// Run to completion, collecting the event trace into the outcome
    pub fn run(&mut self, network: &mut Network) -> RolloutOutcome {
        let mut events = Vec::new();
        let mut outcome = self.run_with(network, |event| events.push(event.clone()));
        outcome.events = events;
        outcome
    }

    /// Run to completion, handing each decision event to `observer` as it happens
    pub fn run_with<O>(&mut self, network: &mut Network, mut observer: O) -> RolloutOutcome
    where
        O: FnMut(&RolloutEvent),
    {
        let mut outcome = RolloutOutcome::empty();

        for epoch in 0..self.config.steps {
            let candidates = self.heuristic.candidates(network, self.config.available_resources);
            if candidates.is_empty() {
                outcome.stop_reason = StopReason::NoDamage;
                break;
            }
            outcome.epochs += 1;
            observer(&RolloutEvent::EpochStarted {
                epoch,
                candidates: candidates.clone(),
            });

            match self.select(network, epoch, &candidates, &mut outcome, &mut observer) {
                Some((node, cost)) => {
                    self.commit(network, epoch, node, cost, &mut outcome, &mut observer)
                }
                None => observer(&RolloutEvent::EpochIdle { epoch }),
            }

            observer(&RolloutEvent::EpochClosed {
                epoch,
                total_restoration_time: outcome.total_restoration_time,
                total_population_restored: outcome.total_population_restored,
            });
        }

        observer(&RolloutEvent::Finished {
            epochs: outcome.epochs,
            reason: outcome.stop_reason,
        });
        outcome
    }

    /// Delay, trial and score each candidate; keep the single cheapest.
    /// Ties go to the earlier candidate.
    fn select<O>(
        &mut self,
        network: &mut Network,
        epoch: usize,
        candidates: &[NodeId],
        outcome: &mut RolloutOutcome,
        observer: &mut O,
    ) -> Option<(NodeId, f64)>
    where
        O: FnMut(&RolloutEvent),
    {
        let mut best = None;
        let mut best_cost = f64::INFINITY;

        for &node in candidates {
            if network.node(node).is_repaired() {
                continue;
            }

            let factor = self.config.delay.apply(network, node, &mut self.rng);
            observer(&RolloutEvent::DelayApplied {
                epoch,
                node,
                factor,
                repair_time: network.node(node).repair_time(),
            });

            if !self.rng.chance(self.config.success_probability) {
                outcome.failed_attempts += 1;
                observer(&RolloutEvent::RepairFailed { epoch, node });
                continue;
            }

            let cost = self.config.cost.cost_if_repaired(network, node);
            observer(&RolloutEvent::CandidateEvaluated { epoch, node, cost });
            if cost < best_cost {
                best_cost = cost;
                best = Some(node);
            }
        }

        best.map(|node| (node, best_cost))
    }

    fn commit<O>(
        &mut self,
        network: &mut Network,
        epoch: usize,
        node: NodeId,
        cost: f64,
        outcome: &mut RolloutOutcome,
        observer: &mut O,
    ) where
        O: FnMut(&RolloutEvent),
    {
        network.mark_repaired(node);

        let committed = network.node(node);
        let repair_time = committed.repair_time();
        let population_served = committed.population_served();
        outcome.actions.push(node);
        outcome.action_names.push(committed.name().to_string());
        outcome.total_restoration_time += repair_time;
        outcome.total_population_restored += population_served;
        observer(&RolloutEvent::RepairCommitted {
            epoch,
            node,
            repair_time,
            population_served,
            cost,
        });

        for to in self.config.propagation.propagate(network, node, &mut self.rng) {
            observer(&RolloutEvent::DamagePropagated { epoch, from: node, to });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DamageState, NodeRecord, ReplaySource};
    use approx::assert_abs_diff_eq;

    fn forced() -> ReplaySource {
        // delay factor 1.0, every trial succeeds
        ReplaySource::constant(0.0).with_uniform(1.0)
    }

    fn isolated(specs: &[(&str, f64, u32, u64)]) -> Network {
        Network::from_records(
            specs.iter().map(|&(n, t, i, p)| NodeRecord::damaged(n, t, i, p)),
            Vec::<(&str, &str)>::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let rng = SeededSource::new(0);
        assert_eq!(
            RolloutScheduler::new(RolloutConfig::new(0, 5), rng.clone()).err(),
            Some(RestoreError::InvalidResourceBudget(0))
        );
        assert_eq!(
            RolloutScheduler::new(RolloutConfig::new(5, 0), rng.clone()).err(),
            Some(RestoreError::InvalidStepCount(0))
        );

        let mut config = RolloutConfig::default();
        config.success_probability = 1.5;
        assert!(matches!(
            RolloutScheduler::new(config, rng.clone()),
            Err(RestoreError::InvalidProbability { .. })
        ));

        // an inverted delay range cannot even be loaded
        let inverted = r#"{"steps": 3, "delay": {"low": 2.0, "high": 1.0}}"#;
        assert!(serde_json::from_str::<RolloutConfig>(inverted).is_err());
    }

    #[test]
    fn test_one_commit_per_epoch() {
        let mut net = isolated(&[("a", 1.0, 3, 1), ("b", 1.0, 2, 1), ("c", 1.0, 1, 1)]);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(10, 2), forced()).unwrap();

        let outcome = scheduler.run(&mut net);
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(outcome.epochs, 2);
        assert_eq!(outcome.stop_reason, StopReason::StepBudgetExhausted);
        assert_eq!(net.damaged_nodes().len(), 1);
    }

    #[test]
    fn test_stops_when_damage_cleared() {
        let mut net = isolated(&[("a", 1.0, 3, 1), ("b", 1.0, 2, 1)]);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(2, 10), forced()).unwrap();

        let outcome = scheduler.run(&mut net);
        assert_eq!(outcome.actions.len(), 2);
        assert_eq!(outcome.epochs, 2);
        assert_eq!(outcome.stop_reason, StopReason::NoDamage);
        assert!(!net.has_damage());
    }

    #[test]
    fn test_lookahead_picks_cheapest_not_most_important() {
        // "big" is most important but cheap to leave; "slow" dominates the cost
        let mut net = isolated(&[("big", 1.0, 9, 500), ("slow", 10.0, 2, 20)]);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(2, 1), forced()).unwrap();

        let outcome = scheduler.run(&mut net);
        assert_eq!(outcome.action_names, vec!["slow"]);
        assert_abs_diff_eq!(outcome.total_restoration_time, 10.0);
        assert_eq!(outcome.total_population_restored, 20);
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let mut net = isolated(&[("x", 1.0, 3, 1), ("y", 1.0, 3, 2)]);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(2, 1), forced()).unwrap();

        let outcome = scheduler.run(&mut net);
        assert_eq!(outcome.action_names, vec!["x"]);
    }

    #[test]
    fn test_failed_trials_leave_epoch_idle() {
        let mut net = isolated(&[("a", 1.0, 3, 1), ("b", 1.0, 2, 1)]);
        let rng = ReplaySource::constant(0.95).with_uniform(1.0);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(2, 3), rng).unwrap();

        let outcome = scheduler.run(&mut net);
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.epochs, 3);
        assert_eq!(outcome.failed_attempts, 6);
        assert_eq!(outcome.total_restoration_time, 0.0);
        let idle = outcome
            .events
            .iter()
            .filter(|e| matches!(e, RolloutEvent::EpochIdle { .. }))
            .count();
        assert_eq!(idle, 3);
    }

    #[test]
    fn test_failed_candidate_is_excluded_from_selection() {
        // "a" would be the cheaper choice but its trial fails
        let mut net = isolated(&[("a", 10.0, 3, 1), ("b", 1.0, 2, 7)]);
        let rng = ReplaySource::new(vec![0.9, 0.1]).with_uniform(1.0);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(2, 1), rng).unwrap();

        let outcome = scheduler.run(&mut net);
        assert_eq!(outcome.action_names, vec!["b"]);
        assert_eq!(outcome.failed_attempts, 1);
        assert!(net.get("a").unwrap().is_damaged());
    }

    #[test]
    fn test_commit_uses_delayed_repair_time() {
        let mut net = isolated(&[("a", 2.0, 5, 100)]);
        let rng = ReplaySource::constant(0.0).with_uniform(1.25);
        let mut scheduler = RolloutScheduler::new(RolloutConfig::new(1, 1), rng).unwrap();

        let outcome = scheduler.run(&mut net);
        assert_abs_diff_eq!(outcome.total_restoration_time, 2.5);
        assert_abs_diff_eq!(net.get("a").unwrap().repair_time(), 2.5);
    }

    #[test]
    fn test_observer_sees_event_trace() {
        let mut net = isolated(&[("a", 1.0, 3, 1)]);
        let mut seen = Vec::new();
        let outcome = RolloutScheduler::new(RolloutConfig::new(1, 3), forced())
            .unwrap()
            .run_with(&mut net, |e| seen.push(e.clone()));

        assert!(outcome.events.is_empty());
        assert!(matches!(seen.first(), Some(RolloutEvent::EpochStarted { epoch: 0, .. })));
        assert_eq!(
            seen.last(),
            Some(&RolloutEvent::Finished { epochs: 1, reason: StopReason::NoDamage })
        );

        let mut replay = isolated(&[("a", 1.0, 3, 1)]);
        let traced = RolloutScheduler::new(RolloutConfig::new(1, 3), forced())
            .unwrap()
            .run(&mut replay);
        assert_eq!(traced.events, seen);
    }

    #[test]
    fn test_empty_network_returns_immediately() {
        let mut net = Network::new();
        let outcome = RolloutScheduler::seeded(RolloutConfig::default(), 1).unwrap().run(&mut net);
        assert!(outcome.actions.is_empty());
        assert_eq!(outcome.epochs, 0);
        assert_eq!(outcome.total_population_restored, 0);
        assert_eq!(outcome.stop_reason, StopReason::NoDamage);
    }

    #[test]
    fn test_intact_network_returns_immediately() {
        let mut net = Network::from_records(
            vec![NodeRecord::new("a", DamageState::Intact, 1.0, 1, 1)],
            Vec::<(&str, &str)>::new(),
        )
        .unwrap();
        let mut rng = ReplaySource::constant(0.0);
        let outcome = RolloutScheduler::new(RolloutConfig::default(), &mut rng)
            .unwrap()
            .run(&mut net);
        assert!(outcome.actions.is_empty());
        assert_eq!(rng.draws(), 0);
    }
}
