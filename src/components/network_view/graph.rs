//! In-memory network topology and per-node infection flags.
//!
//! The [`Graph`] is the single source of truth for "what is infected". It is
//! built wholesale from a topology response and afterwards only its infection
//! flags change. Positions are owned by the layouts, never by the graph.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::types::{InfectionSnapshot, NodeId, TopologyResponse};

/// A network node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
	pub id: NodeId,
	/// Number of incident edges, drives the visual radius.
	pub degree: u32,
	pub infected: bool,
}

/// An unordered pair of node ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
	pub source: NodeId,
	pub target: NodeId,
}

impl Edge {
	/// The endpoint opposite `id`, if `id` is an endpoint.
	pub fn other(&self, id: NodeId) -> Option<NodeId> {
		if self.source == id {
			Some(self.target)
		} else if self.target == id {
			Some(self.source)
		} else {
			None
		}
	}

	fn key(&self) -> (NodeId, NodeId) {
		if self.source <= self.target {
			(self.source, self.target)
		} else {
			(self.target, self.source)
		}
	}
}

/// Counts from applying an infection snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotReport {
	/// Known ids whose flag was written.
	pub updated: usize,
	/// Snapshot ids that are not part of the live graph.
	pub ignored: usize,
}

/// The live network: nodes, undirected edges and an id index.
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	index: HashMap<NodeId, usize>,
}

impl Graph {
	/// Build a graph from a topology response, replacing nothing but itself.
	///
	/// Links with unknown endpoints, self-loops and repeated pairs are dropped
	/// so that every edge is a distinct unordered pair of known nodes.
	pub fn load(topology: &TopologyResponse) -> Self {
		let mut nodes = Vec::with_capacity(topology.nodes.len());
		let mut index = HashMap::with_capacity(topology.nodes.len());

		for record in &topology.nodes {
			if index.contains_key(&record.id) {
				warn!("epidemic-view: duplicate node id {} ignored", record.id);
				continue;
			}
			index.insert(record.id, nodes.len());
			nodes.push(Node {
				id: record.id,
				degree: record.degree.unwrap_or(0),
				infected: record.infected,
			});
		}

		let mut seen = HashSet::with_capacity(topology.links.len());
		let mut edges = Vec::with_capacity(topology.links.len());
		let mut dropped = 0usize;
		for link in &topology.links {
			let edge = Edge {
				source: link.source,
				target: link.target,
			};
			let known = index.contains_key(&edge.source) && index.contains_key(&edge.target);
			if !known || edge.source == edge.target || !seen.insert(edge.key()) {
				dropped += 1;
				continue;
			}
			edges.push(edge);
		}
		if dropped > 0 {
			warn!("epidemic-view: dropped {dropped} links (unknown endpoint, self-loop or duplicate)");
		}

		// Fill in degrees the service did not send.
		let missing: Vec<usize> = topology
			.nodes
			.iter()
			.filter(|r| r.degree.is_none())
			.filter_map(|r| index.get(&r.id).copied())
			.collect();
		if !missing.is_empty() {
			let mut counts: HashMap<NodeId, u32> = HashMap::new();
			for edge in &edges {
				*counts.entry(edge.source).or_insert(0) += 1;
				*counts.entry(edge.target).or_insert(0) += 1;
			}
			for i in missing {
				nodes[i].degree = counts.get(&nodes[i].id).copied().unwrap_or(0);
			}
		}

		Self {
			nodes,
			edges,
			index,
		}
	}

	/// Overwrite the infection flag of every known id present in `snapshot`.
	///
	/// Ids absent from the snapshot keep their flag; ids unknown to the graph
	/// are skipped. Degrees are never touched.
	pub fn apply_infection_snapshot(&mut self, snapshot: &InfectionSnapshot) -> SnapshotReport {
		let mut report = SnapshotReport::default();
		for (id, entry) in snapshot {
			match self.index.get(id) {
				Some(&i) => {
					self.nodes[i].infected = entry.infected;
					report.updated += 1;
				}
				None => report.ignored += 1,
			}
		}
		if report.ignored > 0 {
			debug!(
				"epidemic-view: snapshot referenced {} unknown node ids",
				report.ignored
			);
		}
		report
	}

	/// Mark every node healthy.
	pub fn reset_infections(&mut self) {
		for node in &mut self.nodes {
			node.infected = false;
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	pub fn node_count(&self) -> usize {
		self.nodes.len()
	}

	pub fn edge_count(&self) -> usize {
		self.edges.len()
	}

	/// Position of `id` in [`Graph::nodes`].
	pub fn index_of(&self, id: NodeId) -> Option<usize> {
		self.index.get(&id).copied()
	}

	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.index_of(id).map(|i| &self.nodes[i])
	}

	pub fn infected_count(&self) -> usize {
		self.nodes.iter().filter(|n| n.infected).count()
	}

	/// Edges touching `id` as `(edge index, neighbor)`, in edge-list order.
	pub fn incident(&self, id: NodeId) -> impl Iterator<Item = (usize, NodeId)> + '_ {
		self.edges
			.iter()
			.enumerate()
			.filter_map(move |(i, e)| e.other(id).map(|other| (i, other)))
	}
}
