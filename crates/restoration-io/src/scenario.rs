use std::path::Path;

use anyhow::Context;
use restoration_core::{Network, NodeRecord, RolloutConfig};
use serde::{Deserialize, Serialize};

/// Topology input: node records plus undirected edges by name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

fn default_name() -> String {
    "unnamed".to_string()
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario = serde_json::from_str(&json)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        Ok(scenario)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing scenario {}", path.display()))?;
        Ok(())
    }

    /// Register every node and edge; any duplicate or dangling name fails here
    pub fn build(&self) -> anyhow::Result<Network> {
        let network = Network::from_records(self.nodes.iter().cloned(), self.edges.iter().cloned())
            .with_context(|| format!("building network for scenario `{}`", self.name))?;
        Ok(network)
    }

    /// Twelve damaged electric power nodes (EPN) with eleven dependencies
    pub fn epn() -> Self {
        let nodes = vec![
            NodeRecord::damaged("EPN-1", 30.0, 5, 300),
            NodeRecord::damaged("EPN-2", 1.0, 3, 100),
            NodeRecord::damaged("EPN-3", 1.0, 2, 50),
            NodeRecord::damaged("EPN-4", 0.5, 1, 50),
            NodeRecord::damaged("EPN-5", 1.0, 4, 100),
            NodeRecord::damaged("EPN-6", 0.5, 1, 50),
            NodeRecord::damaged("EPN-7", 1.0, 4, 100),
            NodeRecord::damaged("EPN-8", 7.0, 5, 200),
            NodeRecord::damaged("EPN-9", 0.5, 2, 30),
            NodeRecord::damaged("EPN-10", 0.5, 2, 30),
            NodeRecord::damaged("EPN-11", 3.0, 3, 80),
            NodeRecord::damaged("EPN-12", 30.0, 5, 300),
        ];
        let edges = [
            ("EPN-1", "EPN-2"),
            ("EPN-1", "EPN-3"),
            ("EPN-2", "EPN-4"),
            ("EPN-2", "EPN-5"),
            ("EPN-3", "EPN-6"),
            ("EPN-5", "EPN-11"),
            ("EPN-6", "EPN-12"),
            ("EPN-8", "EPN-1"),
            ("EPN-9", "EPN-2"),
            ("EPN-10", "EPN-3"),
            ("EPN-10", "EPN-7"),
        ]
        .iter()
        .map(|&(a, b)| (a.to_string(), b.to_string()))
        .collect();

        Self {
            name: "epn".to_string(),
            nodes,
            edges,
        }
    }
}

/// Read a full `RolloutConfig` from JSON; missing fields take defaults
pub fn load_config(path: &Path) -> anyhow::Result<RolloutConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&json)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
