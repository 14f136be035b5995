use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use restoration_core::{
    run_replications, EnsembleSpec, RepairDelay, RolloutConfig, RolloutOutcome, RolloutScheduler,
    SeededSource,
};

use crate::report::{log_event, print_outcome, print_summary};
use crate::{
    load_config, write_json, write_run_with_manifest, EnsembleRecord, RunManifest, RunRecord,
    Scenario,
};

#[derive(Parser)]
#[command(name = "restore")]
#[command(about = "Rollout scheduling of post-disaster infrastructure repairs")]
#[command(long_about = "Chooses which damaged facility to repair each epoch by one-step lookahead \
                        on a surrogate cost-to-go, with random repair delays, probabilistic repair \
                        success and cascading damage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one seeded rollout and report the repair order
    Run {
        #[command(flatten)]
        common: CommonArgs,

        /// Write outcome, event trace and final node states as JSON
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write only the final node states (for rendering) as JSON
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Run independently seeded rollouts and summarise them
    Replicate {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of replications
        #[arg(long, default_value = "1000")]
        replications: usize,

        /// Run replications on one thread
        #[arg(long)]
        serial: bool,

        /// Write the ensemble summary as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Write the built-in EPN scenario as a JSON scenario file
    Scenario {
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct CommonArgs {
    /// Scenario JSON file (default: built-in EPN network)
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// RolloutConfig JSON file; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Candidates considered per epoch
    #[arg(long)]
    pub resources: Option<usize>,

    /// Epoch budget
    #[arg(long)]
    pub steps: Option<usize>,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    #[arg(long)]
    pub success_probability: Option<f64>,

    #[arg(long)]
    pub propagation_probability: Option<f64>,

    /// Lower bound of the repair delay factor
    #[arg(long)]
    pub delay_low: Option<f64>,

    /// Upper bound (exclusive) of the repair delay factor
    #[arg(long)]
    pub delay_high: Option<f64>,
}

impl CommonArgs {
    pub fn load_scenario(&self) -> anyhow::Result<Scenario> {
        match &self.scenario {
            Some(path) => Scenario::load(path),
            None => Ok(Scenario::epn()),
        }
    }

    /// Config file (or defaults) with command-line overrides applied
    pub fn rollout_config(&self) -> anyhow::Result<RolloutConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => RolloutConfig::default(),
        };
        if let Some(resources) = self.resources {
            config.available_resources = resources;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(p) = self.success_probability {
            config.success_probability = p;
        }
        if let Some(p) = self.propagation_probability {
            config.propagation.probability = p;
        }
        if self.delay_low.is_some() || self.delay_high.is_some() {
            let low = self.delay_low.unwrap_or(config.delay.low());
            let high = self.delay_high.unwrap_or(config.delay.high());
            config.delay = RepairDelay::new(low, high)?;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn run_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run { common, out, snapshot } => {
            run_single(&common, out, snapshot)?;
        }
        Commands::Replicate { common, replications, serial, out } => {
            run_ensemble(&common, replications, serial, out)?;
        }
        Commands::Scenario { out } => {
            Scenario::epn().save(&out)?;
            tracing::info!(path = %out.display(), "wrote EPN scenario");
        }
    }
    Ok(())
}

pub fn run_single(
    common: &CommonArgs,
    out: Option<PathBuf>,
    snapshot: Option<PathBuf>,
) -> anyhow::Result<RolloutOutcome> {
    let scenario = common.load_scenario()?;
    let config = common.rollout_config()?;
    let mut network = scenario.build()?;
    tracing::info!(
        scenario = %scenario.name,
        nodes = network.num_nodes(),
        edges = network.num_edges(),
        damaged = network.damaged_nodes().len(),
        resources = config.available_resources,
        steps = config.steps,
        seed = common.seed,
        "starting rollout"
    );

    let mut scheduler = RolloutScheduler::new(config.clone(), SeededSource::new(common.seed))?;
    // names never change during a run, so a pre-run copy resolves them for logging
    let names = network.clone();
    let mut events = Vec::new();
    let mut outcome = scheduler.run_with(&mut network, |event| {
        log_event(&names, event);
        events.push(event.clone());
    });
    outcome.events = events;
    print_outcome(&outcome);

    let nodes = network.snapshot(&outcome.actions);
    if let Some(path) = snapshot {
        write_json(&path, &nodes)?;
        tracing::info!(path = %path.display(), "wrote snapshot");
    }
    if let Some(path) = out {
        let record = RunRecord {
            manifest: RunManifest::new(common.seed, &scenario.name, &config),
            outcome: outcome.clone(),
            snapshot: nodes,
        };
        write_run_with_manifest(&record, &path)?;
    }

    Ok(outcome)
}

pub fn run_ensemble(
    common: &CommonArgs,
    replications: usize,
    serial: bool,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let scenario = common.load_scenario()?;
    let config = common.rollout_config()?;
    let network = scenario.build()?;

    let mut spec = EnsembleSpec::new(replications, common.seed);
    spec.use_parallel = !serial;
    tracing::info!(
        scenario = %scenario.name,
        replications,
        parallel = spec.use_parallel,
        "running ensemble"
    );

    let ensemble = run_replications(&network, &config, spec)?;
    let summary = ensemble.summary();
    print_summary(&summary);

    if let Some(path) = out {
        let record = EnsembleRecord {
            manifest: RunManifest::new(common.seed, &scenario.name, &config)
                .with_replications(replications),
            summary,
        };
        write_json(&path, &record)?;
        tracing::info!(path = %path.display(), "wrote ensemble summary");
    }
    Ok(())
}
