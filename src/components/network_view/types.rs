//! Wire types exchanged with the simulation service.
//!
//! Topology and infection payloads are normalized here so that nothing
//! downstream has to care whether a link endpoint arrived as a raw id or as an
//! embedded node object, or whether the topology was nested under `graph`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, server-assigned node identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A node as described by the topology response.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeRecord {
	pub id: NodeId,
	/// Number of incident links. Derived from the link list when absent.
	#[serde(default)]
	pub degree: Option<u32>,
	/// Present on freshly generated networks, always `false` in practice.
	#[serde(default)]
	pub infected: bool,
}

/// A link endpoint: either the bare id or an embedded node object.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
enum Endpoint {
	Id(NodeId),
	Embedded { id: NodeId },
}

impl From<Endpoint> for NodeId {
	fn from(endpoint: Endpoint) -> Self {
		match endpoint {
			Endpoint::Id(id) | Endpoint::Embedded { id } => id,
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct LinkWire {
	source: Endpoint,
	target: Endpoint,
}

/// An undirected link in canonical `{source, target}` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "LinkWire")]
pub struct LinkRecord {
	pub source: NodeId,
	pub target: NodeId,
}

impl From<LinkWire> for LinkRecord {
	fn from(wire: LinkWire) -> Self {
		Self {
			source: wire.source.into(),
			target: wire.target.into(),
		}
	}
}

/// Summary statistics computed by the service when generating a network.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NetworkStats {
	#[serde(default)]
	pub total_nodes: Option<usize>,
	#[serde(default)]
	pub total_edges: Option<usize>,
	#[serde(default)]
	pub avg_degree: Option<f64>,
	#[serde(default)]
	pub clustering_coefficient: Option<f64>,
}

impl NetworkStats {
	/// One-line description of whichever statistics the service provided.
	pub fn summary(&self) -> String {
		let mut parts = Vec::new();
		if let Some(edges) = self.total_edges {
			parts.push(format!("Edges: {edges}"));
		}
		if let Some(avg) = self.avg_degree {
			parts.push(format!("Avg Degree: {avg:.2}"));
		}
		if let Some(cc) = self.clustering_coefficient {
			parts.push(format!("Clustering: {cc:.3}"));
		}
		parts.join(", ")
	}
}

#[derive(Clone, Debug, Deserialize)]
struct TopologyBody {
	nodes: Vec<NodeRecord>,
	#[serde(default)]
	links: Vec<LinkRecord>,
}

/// Response of the `initialize` call: the full network topology.
///
/// The service nests nodes and links under `graph`; a flat body with
/// top-level `nodes` is accepted too. The shape is chosen by the presence of
/// the `graph` key, so a broken nested body is an error rather than an empty
/// network.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct TopologyResponse {
	pub nodes: Vec<NodeRecord>,
	pub links: Vec<LinkRecord>,
	pub stats: NetworkStats,
}

impl TryFrom<serde_json::Value> for TopologyResponse {
	type Error = serde_json::Error;

	fn try_from(mut value: serde_json::Value) -> Result<Self, Self::Error> {
		let stats = match value.get_mut("stats").map(serde_json::Value::take) {
			Some(serde_json::Value::Null) | None => NetworkStats::default(),
			Some(stats) => NetworkStats::deserialize(stats)?,
		};
		let body = match value.get_mut("graph").map(serde_json::Value::take) {
			Some(graph) => TopologyBody::deserialize(graph)?,
			None => TopologyBody::deserialize(value)?,
		};
		Ok(Self {
			nodes: body.nodes,
			links: body.links,
			stats,
		})
	}
}

/// Per-node infection state inside a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct InfectionEntry {
	pub infected: bool,
	#[serde(default = "never_infected")]
	pub infection_time: i64,
}

fn never_infected() -> i64 {
	-1
}

/// Mapping from node id to infection state. May be partial.
pub type InfectionSnapshot = HashMap<NodeId, InfectionEntry>;

/// Aggregate run statistics reported after every simulation action.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Statistics {
	pub time_step: u32,
	pub total_nodes: usize,
	pub infected_count: usize,
	pub healthy_count: usize,
	pub infection_rate: f64,
}

impl Statistics {
	/// Statistics of a network where every node is healthy at time step 0.
	pub fn baseline(total_nodes: usize) -> Self {
		Self {
			time_step: 0,
			total_nodes,
			infected_count: 0,
			healthy_count: total_nodes,
			infection_rate: 0.0,
		}
	}

	/// Infection rate as a percentage string with one decimal.
	pub fn rate_percent(&self) -> String {
		format!("{:.1}%", self.infection_rate * 100.0)
	}
}

/// Result of `start` and `infect`: a snapshot plus statistics.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RunUpdate {
	#[serde(default)]
	pub infection_state: InfectionSnapshot,
	#[serde(default)]
	pub statistics: Statistics,
}

/// Outcome flags of a single spreading step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StepResult {
	#[serde(default)]
	pub is_outbreak_over: bool,
}

/// Result of `step`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StepUpdate {
	#[serde(default)]
	pub infection_state: InfectionSnapshot,
	#[serde(default)]
	pub statistics: Statistics,
	#[serde(default)]
	pub step_result: StepResult,
}

/// Parameters for generating a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitializeRequest {
	pub n_nodes: usize,
	pub m_edges: usize,
	pub network_type: String,
}

impl Default for InitializeRequest {
	fn default() -> Self {
		Self {
			n_nodes: 200,
			m_edges: 3,
			network_type: "barabasi_albert".into(),
		}
	}
}

/// Parameters for seeding a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartRequest {
	pub infection_probability: f64,
	pub num_initial: usize,
}

impl Default for StartRequest {
	fn default() -> Self {
		Self {
			infection_probability: 0.3,
			num_initial: 5,
		}
	}
}

#[derive(Serialize)]
pub(crate) struct InfectRequest {
	pub node_id: NodeId,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nested_topology_under_graph_key() {
		let json = r#"{
			"status": "success",
			"graph": {
				"nodes": [{"id": 0, "infected": false, "degree": 1, "infection_time": -1},
				          {"id": 1, "infected": false, "degree": 1, "infection_time": -1}],
				"links": [{"source": 0, "target": 1}]
			},
			"stats": {"total_nodes": 2, "total_edges": 1}
		}"#;
		let topo: TopologyResponse = serde_json::from_str(json).unwrap();
		assert_eq!(topo.nodes.len(), 2);
		assert_eq!(topo.links, vec![LinkRecord { source: NodeId(0), target: NodeId(1) }]);
		assert_eq!(topo.stats.total_edges, Some(1));
		assert_eq!(topo.stats.avg_degree, None);
	}

	#[test]
	fn flat_topology_with_embedded_endpoints() {
		let json = r#"{
			"nodes": [{"id": 3}, {"id": 4}],
			"links": [{"source": {"id": 3, "x": 1.0}, "target": 4}],
			"stats": {"total_edges": 1, "avg_degree": 1.0, "clustering_coefficient": 0.0}
		}"#;
		let topo: TopologyResponse = serde_json::from_str(json).unwrap();
		assert_eq!(topo.nodes[0].degree, None);
		assert_eq!(topo.links[0].source, NodeId(3));
		assert_eq!(topo.links[0].target, NodeId(4));
	}

	#[test]
	fn broken_nested_topology_is_rejected() {
		let bad_link = r#"{
			"status": "success",
			"graph": {
				"nodes": [{"id": 0}, {"id": 1}],
				"links": [{"source": "zero", "target": 1}]
			}
		}"#;
		assert!(serde_json::from_str::<TopologyResponse>(bad_link).is_err());
		assert!(serde_json::from_str::<TopologyResponse>(r#"{"graph": {"links": []}}"#).is_err());
		assert!(serde_json::from_str::<TopologyResponse>(r#"{"status": "success"}"#).is_err());
	}

	#[test]
	fn snapshot_keys_are_stringified_ids() {
		let json = r#"{
			"infection_state": {"0": {"infected": true, "infection_time": 0}, "7": {"infected": false}},
			"statistics": {"time_step": 2, "total_nodes": 8, "infected_count": 1,
			               "healthy_count": 7, "infection_rate": 0.125},
			"step_result": {"is_outbreak_over": true, "new_infections": 0}
		}"#;
		let step: StepUpdate = serde_json::from_str(json).unwrap();
		assert!(step.infection_state[&NodeId(0)].infected);
		assert_eq!(step.infection_state[&NodeId(7)].infection_time, -1);
		assert_eq!(step.statistics.time_step, 2);
		assert!(step.step_result.is_outbreak_over);
		assert_eq!(step.statistics.rate_percent(), "12.5%");
	}

	#[test]
	fn missing_statistics_fields_default_to_zero() {
		let update: RunUpdate = serde_json::from_str(r#"{"statistics": {"time_step": 1}}"#).unwrap();
		assert_eq!(update.statistics.time_step, 1);
		assert_eq!(update.statistics.infected_count, 0);
		assert!(update.infection_state.is_empty());
	}

	#[test]
	fn stats_summary_lists_available_fields() {
		let stats = NetworkStats {
			total_edges: Some(591),
			avg_degree: Some(5.91),
			..Default::default()
		};
		assert_eq!(stats.summary(), "Edges: 591, Avg Degree: 5.91");
		assert_eq!(NetworkStats::default().summary(), "");
	}
}
