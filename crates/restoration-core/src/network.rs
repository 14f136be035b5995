use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{NodeId, RestoreError, Result};

/// Per-node damage status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageState {
    Intact,
    Damaged,
    Repaired,
}

/// Node description handed over by whoever builds the topology
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub damage_state: DamageState,
    #[serde(alias = "base_repair_time")]
    pub repair_time: f64, // base repair time, days
    pub importance: u32,
    pub population_served: u64,
}

impl NodeRecord {
    pub fn new(
        name: impl Into<String>,
        damage_state: DamageState,
        repair_time: f64,
        importance: u32,
        population_served: u64,
    ) -> Self {
        Self {
            name: name.into(),
            damage_state,
            repair_time,
            importance,
            population_served,
        }
    }

    /// Shorthand for a damaged facility
    pub fn damaged(
        name: impl Into<String>,
        repair_time: f64,
        importance: u32,
        population_served: u64,
    ) -> Self {
        Self::new(name, DamageState::Damaged, repair_time, importance, population_served)
    }
}

/// Registered facility with its live repair state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
    name: String,
    damage_state: DamageState,
    base_repair_time: f64,
    repair_time: f64,
    importance: u32,
    population_served: u64,
    repaired: bool,
}

impl Node {
    fn from_record(record: NodeRecord) -> Self {
        Self {
            name: record.name,
            damage_state: record.damage_state,
            base_repair_time: record.repair_time,
            repair_time: record.repair_time,
            importance: record.importance,
            population_served: record.population_served,
            repaired: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn damage_state(&self) -> DamageState {
        self.damage_state
    }

    pub fn is_damaged(&self) -> bool {
        self.damage_state == DamageState::Damaged
    }

    pub fn base_repair_time(&self) -> f64 {
        self.base_repair_time
    }

    /// Current (possibly delayed) repair duration
    pub fn repair_time(&self) -> f64 {
        self.repair_time
    }

    pub fn importance(&self) -> u32 {
        self.importance
    }

    pub fn population_served(&self) -> u64 {
        self.population_served
    }

    /// Permanently repaired by a committed action
    pub fn is_repaired(&self) -> bool {
        self.repaired
    }
}

/// Read-only view of a node for renderers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub name: String,
    pub damage_state: DamageState,
    pub population_served: u64,
    pub repaired: bool,
    /// Position in the action log, if the node was committed
    pub repair_rank: Option<usize>,
    /// Green intensity in [0.5, 1]: earlier repairs are darker
    pub shade: Option<f64>,
}

/// Node registry plus static undirected adjacency.
///
/// Neighbor lists are kept sorted by node name so that every walk over
/// them (penalty scoring, propagation draws) happens in a fixed order.
#[derive(Clone, Debug, Default)]
pub struct Network {
    nodes: Vec<Node>,
    num_edges: usize,
    index: HashMap<String, NodeId>,
    adjacency: Vec<Vec<NodeId>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a network from node records and named edges
    pub fn from_records<I, E, S>(records: I, edges: E) -> Result<Self>
    where
        I: IntoIterator<Item = NodeRecord>,
        E: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut network = Self::new();
        for record in records {
            network.add_node(record)?;
        }
        for (a, b) in edges {
            network.add_edge(a.as_ref(), b.as_ref())?;
        }
        Ok(network)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Register a node; `repair_time` starts at the base value, `repaired` at false
    pub fn add_node(&mut self, record: NodeRecord) -> Result<NodeId> {
        if self.index.contains_key(&record.name) {
            return Err(RestoreError::DuplicateNode(record.name));
        }
        if !record.repair_time.is_finite() || record.repair_time <= 0.0 {
            return Err(RestoreError::InvalidNode {
                name: record.name,
                reason: format!("repair time must be positive, got {}", record.repair_time),
            });
        }
        if record.importance == 0 {
            return Err(RestoreError::InvalidNode {
                name: record.name,
                reason: "importance must be a positive integer".to_string(),
            });
        }

        let id = self.nodes.len();
        self.index.insert(record.name.clone(), id);
        self.nodes.push(Node::from_record(record));
        self.adjacency.push(Vec::new());
        Ok(id)
    }

    /// Connect two registered nodes. Re-adding an existing edge is a no-op.
    pub fn add_edge(&mut self, a: &str, b: &str) -> Result<()> {
        let u = self.require(a)?;
        let v = self.require(b)?;
        if u == v {
            return Err(RestoreError::SelfLoop(a.to_string()));
        }
        if self.adjacency[u].contains(&v) {
            return Ok(());
        }

        insert_by_name(&self.nodes, &mut self.adjacency[u], v);
        insert_by_name(&self.nodes, &mut self.adjacency[v], u);
        self.num_edges += 1;
        Ok(())
    }

    pub fn id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    fn require(&self, name: &str) -> Result<NodeId> {
        self.id(name).ok_or_else(|| RestoreError::UnknownNode(name.to_string()))
    }

    /// # Panics
    /// If `id` was not returned by this network.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.id(name).map(|id| &self.nodes[id])
    }

    /// Nodes in registry (insertion) order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Neighbors of `id`, ascending by name
    pub fn neighbors(&self, id: NodeId) -> &[NodeId] {
        self.adjacency.get(id).map(|adj| adj.as_slice()).unwrap_or(&[])
    }

    /// Currently damaged nodes in registry order
    pub fn damaged_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_damaged())
            .map(|(id, _)| id)
            .collect()
    }

    pub fn has_damage(&self) -> bool {
        self.nodes.iter().any(Node::is_damaged)
    }

    pub fn name_of(&self, id: NodeId) -> &str {
        &self.nodes[id].name
    }

    pub(crate) fn set_repair_time(&mut self, id: NodeId, repair_time: f64) {
        self.nodes[id].repair_time = repair_time;
    }

    /// Commit a repair: terminal, never reverts
    pub(crate) fn mark_repaired(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        node.damage_state = DamageState::Repaired;
        node.repaired = true;
    }

    /// Damage a node unless it is permanently repaired. Returns whether the state changed.
    pub(crate) fn mark_damaged(&mut self, id: NodeId) -> bool {
        let node = &mut self.nodes[id];
        if node.repaired || node.damage_state == DamageState::Damaged {
            return false;
        }
        node.damage_state = DamageState::Damaged;
        true
    }

    /// Rendering view, colouring committed nodes by their position in `actions`
    pub fn snapshot(&self, actions: &[NodeId]) -> Vec<NodeView> {
        let n_actions = actions.len();
        self.nodes
            .iter()
            .enumerate()
            .map(|(id, node)| {
                let repair_rank = actions.iter().position(|&a| a == id);
                let shade = repair_rank.map(|rank| 1.0 - (rank as f64 / n_actions as f64) * 0.5);
                NodeView {
                    name: node.name.clone(),
                    damage_state: node.damage_state,
                    population_served: node.population_served,
                    repaired: node.repaired,
                    repair_rank,
                    shade,
                }
            })
            .collect()
    }
}

fn insert_by_name(nodes: &[Node], adj: &mut Vec<NodeId>, id: NodeId) {
    let name = nodes[id].name.as_str();
    let pos = adj.partition_point(|&other| nodes[other].name.as_str() < name);
    adj.insert(pos, id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Network {
        Network::from_records(
            vec![
                NodeRecord::damaged("C", 1.0, 2, 10),
                NodeRecord::damaged("A", 2.0, 5, 100),
                NodeRecord::new("B", DamageState::Intact, 3.0, 1, 5),
            ],
            vec![("C", "A"), ("C", "B"), ("A", "B")],
        )
        .unwrap()
    }

    #[test]
    fn test_add_node_defaults() {
        let mut net = Network::new();
        let id = net.add_node(NodeRecord::damaged("EPN-1", 30.0, 5, 300)).unwrap();
        let node = net.node(id);
        assert_eq!(node.repair_time(), 30.0);
        assert_eq!(node.base_repair_time(), 30.0);
        assert!(!node.is_repaired());
        assert!(node.is_damaged());
    }

    #[test]
    fn test_duplicate_node() {
        let mut net = Network::new();
        net.add_node(NodeRecord::damaged("A", 1.0, 1, 1)).unwrap();
        let err = net.add_node(NodeRecord::damaged("A", 2.0, 2, 2)).unwrap_err();
        assert_eq!(err, RestoreError::DuplicateNode("A".to_string()));
        assert_eq!(net.num_nodes(), 1);
    }

    #[test]
    fn test_invalid_records() {
        let mut net = Network::new();
        assert!(matches!(
            net.add_node(NodeRecord::damaged("A", 0.0, 1, 1)),
            Err(RestoreError::InvalidNode { .. })
        ));
        assert!(matches!(
            net.add_node(NodeRecord::damaged("B", f64::NAN, 1, 1)),
            Err(RestoreError::InvalidNode { .. })
        ));
        assert!(matches!(
            net.add_node(NodeRecord::damaged("C", 1.0, 0, 1)),
            Err(RestoreError::InvalidNode { .. })
        ));
        assert!(net.is_empty());
    }

    #[test]
    fn test_unknown_endpoint_and_self_loop() {
        let mut net = Network::new();
        net.add_node(NodeRecord::damaged("A", 1.0, 1, 1)).unwrap();
        assert_eq!(
            net.add_edge("A", "Z").unwrap_err(),
            RestoreError::UnknownNode("Z".to_string())
        );
        assert_eq!(
            net.add_edge("A", "A").unwrap_err(),
            RestoreError::SelfLoop("A".to_string())
        );
        assert_eq!(net.num_edges(), 0);
    }

    #[test]
    fn test_neighbors_sorted_by_name() {
        let net = triangle();
        let c = net.id("C").unwrap();
        let names: Vec<&str> = net.neighbors(c).iter().map(|&n| net.name_of(n)).collect();
        assert_eq!(names, vec!["A", "B"]);

        let a = net.id("A").unwrap();
        let names: Vec<&str> = net.neighbors(a).iter().map(|&n| net.name_of(n)).collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn test_duplicate_edge_is_noop() {
        let mut net = triangle();
        net.add_edge("A", "C").unwrap();
        assert_eq!(net.num_edges(), 3);
        assert_eq!(net.neighbors(net.id("A").unwrap()).len(), 2);
    }

    #[test]
    fn test_damaged_nodes_registry_order() {
        let net = triangle();
        let names: Vec<&str> = net.damaged_nodes().iter().map(|&n| net.name_of(n)).collect();
        assert_eq!(names, vec!["C", "A"]);
        assert!(net.has_damage());
    }

    #[test]
    fn test_repaired_is_terminal() {
        let mut net = triangle();
        let a = net.id("A").unwrap();
        net.mark_repaired(a);
        assert!(!net.mark_damaged(a));
        assert_eq!(net.node(a).damage_state(), DamageState::Repaired);
        assert!(net.node(a).is_repaired());
    }

    #[test]
    fn test_snapshot_shades() {
        let mut net = triangle();
        let a = net.id("A").unwrap();
        let c = net.id("C").unwrap();
        net.mark_repaired(a);
        net.mark_repaired(c);

        let view = net.snapshot(&[a, c]);
        assert_eq!(view[a].repair_rank, Some(0));
        assert_eq!(view[a].shade, Some(1.0));
        assert_eq!(view[c].repair_rank, Some(1));
        assert!((view[c].shade.unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(view[net.id("B").unwrap()].shade, None);
    }
}
