use std::path::Path;

use anyhow::Context;
use restoration_core::{EnsembleSummary, NodeView, RolloutConfig, RolloutOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod cli;
pub mod report;
pub mod scenario;

pub use cli::*;
pub use scenario::{load_config, Scenario};

/// Run manifest for complete reproducibility
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub timestamp: String,
    pub seed: u64,
    pub scenario: String,
    pub config: RolloutConfig,
    pub replications: Option<usize>,
    pub commit_hash: Option<String>,
    pub rust_version: String,
}

/// Everything a single run produced: manifest, outcome and final node states
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub manifest: RunManifest,
    pub outcome: RolloutOutcome,
    pub snapshot: Vec<NodeView>,
}

/// Ensemble output: manifest plus statistical summary
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnsembleRecord {
    pub manifest: RunManifest,
    pub summary: EnsembleSummary,
}

impl RunManifest {
    pub fn new(seed: u64, scenario: &str, config: &RolloutConfig) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            seed,
            scenario: scenario.to_string(),
            config: config.clone(),
            replications: None,
            commit_hash: get_git_commit(),
            rust_version: get_rust_version(),
        }
    }

    pub fn with_replications(mut self, replications: usize) -> Self {
        self.replications = Some(replications);
        self
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        write_json(path, self)
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&json)?;
        Ok(manifest)
    }
}

/// Pretty-print any serializable value to `path`
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write the run record and its manifest next to it (`<out>.manifest.json`)
pub fn write_run_with_manifest(record: &RunRecord, out: &Path) -> anyhow::Result<()> {
    write_json(out, record)?;
    let manifest_path = out.with_extension("manifest.json");
    record.manifest.save_to_file(&manifest_path)?;

    tracing::info!(path = %out.display(), "wrote run record");
    tracing::info!(path = %manifest_path.display(), "wrote manifest");
    Ok(())
}

fn get_git_commit() -> Option<String> {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
}

fn get_rust_version() -> String {
    std::process::Command::new("rustc")
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use restoration_core::RolloutScheduler;

    #[test]
    fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.manifest.json");
        let manifest = RunManifest::new(42, "epn", &RolloutConfig::default()).with_replications(10);

        manifest.save_to_file(&path).unwrap();
        let loaded = RunManifest::load_from_file(&path).unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.replications, Some(10));
        assert!(Uuid::parse_str(&loaded.run_id).is_ok());
    }

    #[test]
    fn test_run_record_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("run.json");

        let mut network = Scenario::epn().build().unwrap();
        let config = RolloutConfig::default();
        let outcome = RolloutScheduler::seeded(config.clone(), 3).unwrap().run(&mut network);
        let record = RunRecord {
            manifest: RunManifest::new(3, "epn", &config),
            snapshot: network.snapshot(&outcome.actions),
            outcome,
        };
        write_run_with_manifest(&record, &out).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["manifest"]["seed"], 3);
        assert_eq!(written["snapshot"].as_array().unwrap().len(), 12);
        assert!(dir.path().join("run.manifest.json").exists());
    }
}
