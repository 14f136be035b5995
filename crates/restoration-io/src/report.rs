use restoration_core::{EnsembleSummary, Network, RolloutEvent, RolloutOutcome};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber; `RUST_LOG` overrides the default `info` level
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Render one decision event with node names resolved against `network`
pub fn log_event(network: &Network, event: &RolloutEvent) {
    let name = |id: usize| network.name_of(id);
    match event {
        RolloutEvent::EpochStarted { epoch, candidates } => {
            let names: Vec<&str> = candidates.iter().map(|&n| name(n)).collect();
            info!(epoch, candidates = ?names, "attempting repairs");
        }
        RolloutEvent::DelayApplied { epoch, node, factor, repair_time } => {
            debug!(epoch, node = name(*node), factor, repair_time, "repair delay drawn");
        }
        RolloutEvent::RepairFailed { epoch, node } => {
            info!(epoch, node = name(*node), "repair failed due to probabilistic outcome");
        }
        RolloutEvent::CandidateEvaluated { epoch, node, cost } => {
            debug!(epoch, node = name(*node), cost, "candidate evaluated");
        }
        RolloutEvent::RepairCommitted { epoch, node, repair_time, population_served, .. } => {
            info!(epoch, node = name(*node), repair_time, population_served, "repaired");
        }
        RolloutEvent::DamagePropagated { epoch, from, to } => {
            warn!(epoch, from = name(*from), to = name(*to), "damage propagated");
        }
        RolloutEvent::EpochIdle { epoch } => {
            info!(epoch, "no candidate succeeded this epoch");
        }
        RolloutEvent::EpochClosed { epoch, total_restoration_time, total_population_restored } => {
            info!(epoch, total_restoration_time, total_population_restored, "epoch totals");
        }
        RolloutEvent::Finished { epochs, reason } => {
            info!(epochs, reason = ?reason, "rollout finished");
        }
    }
}

/// Human-readable run summary on stdout
pub fn print_outcome(outcome: &RolloutOutcome) {
    println!("Order of Repaired Nodes: {:?}", outcome.action_names);
    println!("Total Restoration Time: {:.2} days", outcome.total_restoration_time);
    println!("Total Population Restored: {}", outcome.total_population_restored);
    println!("Failed repair attempts: {}", outcome.failed_attempts);
}

pub fn print_summary(summary: &EnsembleSummary) {
    println!("Replications: {}", summary.replications);
    println!(
        "Restoration time: mean {:.3} days, std {:.3}",
        summary.mean_restoration_time,
        summary.var_restoration_time.sqrt()
    );
    println!(
        "Population restored: mean {:.1}, std {:.1}",
        summary.mean_population_restored,
        summary.var_population_restored.sqrt()
    );
    println!(
        "Mean actions: {:.2}, mean failed attempts: {:.2}",
        summary.mean_actions, summary.mean_failed_attempts
    );
    println!();
    println!("{:<12} {:>10} {:>10}", "node", "committed", "first");
    for node in &summary.nodes {
        println!("{:<12} {:>9.1}% {:>9.1}%", node.name, node.committed * 100.0, node.first * 100.0);
    }
}
