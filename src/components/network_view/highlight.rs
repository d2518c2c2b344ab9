//! Focus highlighting shared by both backends.
//!
//! The controller owns the set algebra (neighbors, incident edges) and turns
//! it into a [`SceneStyle`]: one appearance per node and per edge, aligned with
//! [`Graph::nodes`] and [`Graph::edges`]. Backends only translate appearances
//! into their own drawing primitives, so emphasis is identical in 2D and 3D.
//!
//! Every focus change starts from baseline. Moving straight from one node to
//! another is `Focused(a) -> Idle -> Focused(b)`, never an overlay.

use std::collections::HashSet;

use super::graph::Graph;
use super::theme::{Color, EdgeStyle, EmphasisStyle, NodeEmphasis, StatusPalette, Theme};
use super::types::NodeId;

/// Highlight state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FocusState {
	#[default]
	Idle,
	Focused(NodeId),
}

/// Emphasis tier of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeTier {
	Baseline,
	Focused,
	Neighbor,
	Dimmed,
}

/// Emphasis tier of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeTier {
	Baseline,
	Incident,
	Dimmed,
}

/// How one node should be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeAppearance {
	pub color: Color,
	/// Glow color; only visible when `emissive_intensity > 0`.
	pub emissive: Color,
	pub emissive_intensity: f64,
	pub opacity: f64,
	/// Multiplier on the degree-derived radius.
	pub scale: f64,
	pub tier: NodeTier,
}

/// How one edge should be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeAppearance {
	pub color: Color,
	pub opacity: f64,
	pub tier: EdgeTier,
}

/// Appearances aligned with graph node and edge order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneStyle {
	pub nodes: Vec<NodeAppearance>,
	pub edges: Vec<EdgeAppearance>,
}

/// What the info panel shows for the focused node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FocusInfo {
	pub id: NodeId,
	pub infected: bool,
	pub degree: u32,
	/// Neighbor ids in edge-list order.
	pub neighbors: Vec<NodeId>,
}

impl FocusInfo {
	pub fn status_label(&self) -> &'static str {
		if self.infected { "Infected" } else { "Healthy" }
	}

	/// Comma-separated neighbor ids, or `"None"`.
	pub fn neighbor_list(&self) -> String {
		if self.neighbors.is_empty() {
			return "None".to_string();
		}
		self.neighbors
			.iter()
			.map(NodeId::to_string)
			.collect::<Vec<_>>()
			.join(", ")
	}
}

/// Tracks the focused node and derives emphasis for every primitive.
#[derive(Clone, Debug)]
pub struct HighlightController {
	state: FocusState,
	neighbors: HashSet<NodeId>,
	neighbor_order: Vec<NodeId>,
	incident: HashSet<usize>,
	style: SceneStyle,
	status: StatusPalette,
	edge: EdgeStyle,
	emphasis: EmphasisStyle,
}

impl HighlightController {
	pub fn new(theme: &Theme) -> Self {
		Self {
			state: FocusState::Idle,
			neighbors: HashSet::new(),
			neighbor_order: Vec::new(),
			incident: HashSet::new(),
			style: SceneStyle::default(),
			status: theme.status.clone(),
			edge: theme.edge.clone(),
			emphasis: theme.emphasis.clone(),
		}
	}

	pub fn state(&self) -> FocusState {
		self.state
	}

	pub fn focused(&self) -> Option<NodeId> {
		match self.state {
			FocusState::Idle => None,
			FocusState::Focused(id) => Some(id),
		}
	}

	pub fn neighbors(&self) -> &HashSet<NodeId> {
		&self.neighbors
	}

	/// Indices into [`Graph::edges`] of the edges touching the focused node.
	pub fn incident_edges(&self) -> &HashSet<usize> {
		&self.incident
	}

	pub fn style(&self) -> &SceneStyle {
		&self.style
	}

	fn baseline_node(&self, infected: bool) -> NodeAppearance {
		NodeAppearance {
			color: self.status.color(infected),
			emissive: Color::rgb(0, 0, 0),
			emissive_intensity: 0.0,
			opacity: 1.0,
			scale: 1.0,
			tier: NodeTier::Baseline,
		}
	}

	fn baseline_edge(&self) -> EdgeAppearance {
		EdgeAppearance {
			color: self.edge.color,
			opacity: self.edge.opacity,
			tier: EdgeTier::Baseline,
		}
	}

	/// Restore every primitive to its unfocused appearance. State is untouched.
	fn restore_baseline(&mut self, graph: &Graph) {
		self.style.nodes = graph
			.nodes()
			.iter()
			.map(|n| self.baseline_node(n.infected))
			.collect();
		self.style.edges = vec![self.baseline_edge(); graph.edge_count()];
	}

	/// Drop any focus and restore baseline appearance.
	pub fn clear(&mut self, graph: &Graph) {
		self.state = FocusState::Idle;
		self.neighbors.clear();
		self.neighbor_order.clear();
		self.incident.clear();
		self.restore_baseline(graph);
	}

	/// Focus `id`. Unknown ids leave the controller in `Idle`.
	pub fn focus(&mut self, graph: &Graph, id: NodeId) -> Option<FocusInfo> {
		self.clear(graph);
		graph.index_of(id)?;

		for (i, other) in graph.incident(id) {
			self.incident.insert(i);
			if self.neighbors.insert(other) {
				self.neighbor_order.push(other);
			}
		}
		self.state = FocusState::Focused(id);
		self.apply_emphasis(graph, id);
		self.info(graph)
	}

	fn apply_emphasis(&mut self, graph: &Graph, id: NodeId) {
		let emphasize = |base: NodeAppearance, tier: &NodeEmphasis, kind| NodeAppearance {
			color: tier.color,
			emissive: tier.emissive,
			emissive_intensity: tier.emissive_intensity,
			scale: tier.scale,
			tier: kind,
			..base
		};
		let dimmed = self.emphasis.dimmed_opacity;

		for (node, look) in graph.nodes().iter().zip(self.style.nodes.iter_mut()) {
			*look = if node.id == id {
				emphasize(*look, &self.emphasis.focused, NodeTier::Focused)
			} else if self.neighbors.contains(&node.id) {
				emphasize(*look, &self.emphasis.neighbor, NodeTier::Neighbor)
			} else {
				NodeAppearance {
					opacity: dimmed,
					tier: NodeTier::Dimmed,
					..*look
				}
			};
		}

		for (i, look) in self.style.edges.iter_mut().enumerate() {
			*look = if self.incident.contains(&i) {
				EdgeAppearance {
					color: self.emphasis.incident_edge,
					opacity: self.emphasis.incident_edge_opacity,
					tier: EdgeTier::Incident,
				}
			} else {
				EdgeAppearance {
					opacity: dimmed,
					tier: EdgeTier::Dimmed,
					..*look
				}
			};
		}
	}

	/// Re-derive every appearance after infection flags changed.
	///
	/// Baseline colors pick up the new flags, then the current focus (if its
	/// node still exists) is applied on top.
	pub fn refresh(&mut self, graph: &Graph) -> Option<FocusInfo> {
		match self.state {
			FocusState::Idle => {
				self.restore_baseline(graph);
				None
			}
			FocusState::Focused(id) => self.focus(graph, id),
		}
	}

	/// Info panel contents for the current focus.
	pub fn info(&self, graph: &Graph) -> Option<FocusInfo> {
		let id = self.focused()?;
		let node = graph.node(id)?;
		Some(FocusInfo {
			id,
			infected: node.infected,
			degree: node.degree,
			neighbors: self.neighbor_order.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_view::graph::tests::{snapshot, topology};

	fn star() -> Graph {
		Graph::load(&topology(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]))
	}

	fn controller(graph: &Graph) -> HighlightController {
		let mut hl = HighlightController::new(&Theme::default());
		hl.clear(graph);
		hl
	}

	#[test]
	fn star_center_emphasizes_every_leaf() {
		let graph = Graph::load(&topology(6, &[(0, 1), (0, 2), (0, 3), (0, 4)]));
		let mut hl = controller(&graph);
		let info = hl.focus(&graph, NodeId(0)).unwrap();

		let expected: HashSet<NodeId> = (1..=4).map(NodeId).collect();
		assert_eq!(hl.neighbors(), &expected);
		assert_eq!(hl.incident_edges().len(), 4);
		assert_eq!(hl.style().nodes[0].tier, NodeTier::Focused);
		for i in 1..=4 {
			assert_eq!(hl.style().nodes[i].tier, NodeTier::Neighbor);
		}
		assert_eq!(hl.style().nodes[5].tier, NodeTier::Dimmed);
		assert_eq!(hl.style().nodes[5].opacity, 0.08);
		assert!(hl.style().edges.iter().all(|e| e.tier == EdgeTier::Incident));
		assert_eq!(info.neighbor_list(), "1, 2, 3, 4");
		assert_eq!(info.degree, 4);
	}

	#[test]
	fn leaf_focus_dims_unrelated_edges() {
		let graph = star();
		let mut hl = controller(&graph);
		hl.focus(&graph, NodeId(2));
		let tiers: Vec<EdgeTier> = hl.style().edges.iter().map(|e| e.tier).collect();
		assert_eq!(
			tiers,
			vec![EdgeTier::Dimmed, EdgeTier::Incident, EdgeTier::Dimmed, EdgeTier::Dimmed]
		);
		assert_eq!(hl.style().nodes[0].scale, 1.3);
		assert_eq!(hl.style().nodes[2].scale, 1.6);
		assert_eq!(hl.style().nodes[2].emissive_intensity, 1.2);
	}

	#[test]
	fn focus_reports_neighbors_and_edges_from_the_graph() {
		let graph = Graph::load(&topology(5, &[(3, 1), (1, 4), (0, 2), (1, 0)]));
		let mut hl = controller(&graph);
		let info = hl.focus(&graph, NodeId(1)).unwrap();
		assert_eq!(info.neighbors, vec![NodeId(3), NodeId(4), NodeId(0)]);
		let expected: HashSet<usize> = graph.incident(NodeId(1)).map(|(i, _)| i).collect();
		assert_eq!(hl.incident_edges(), &expected);
		assert_eq!(expected, HashSet::from([0, 1, 3]));
	}

	#[test]
	fn neighbor_sets_sum_to_twice_the_edge_count() {
		let graph = Graph::load(&topology(
			8,
			&[(0, 1), (1, 2), (2, 3), (3, 0), (4, 5), (5, 6), (1, 6), (2, 5)],
		));
		let mut hl = controller(&graph);
		let total: usize = graph
			.nodes()
			.iter()
			.map(|n| {
				hl.focus(&graph, n.id);
				hl.neighbors().len()
			})
			.sum();
		assert_eq!(total, 2 * graph.edge_count());
	}

	#[test]
	fn unfocus_restores_exact_baseline() {
		let mut graph = star();
		graph.apply_infection_snapshot(&snapshot(&[(3, true)]));
		let mut hl = controller(&graph);
		let before = hl.style().clone();

		hl.focus(&graph, NodeId(0));
		assert_ne!(hl.style(), &before);
		hl.clear(&graph);

		assert_eq!(hl.style(), &before);
		assert_eq!(hl.state(), FocusState::Idle);
		assert!(hl.neighbors().is_empty());
		assert!(hl.incident_edges().is_empty());
	}

	#[test]
	fn moving_focus_does_not_compound() {
		let graph = star();
		let mut direct = controller(&graph);
		direct.focus(&graph, NodeId(4));

		let mut hopped = controller(&graph);
		hopped.focus(&graph, NodeId(0));
		hopped.focus(&graph, NodeId(1));
		hopped.focus(&graph, NodeId(4));

		assert_eq!(hopped.style(), direct.style());
		assert_eq!(hopped.neighbors(), direct.neighbors());
		assert_eq!(hopped.state(), FocusState::Focused(NodeId(4)));
	}

	#[test]
	fn refresh_keeps_focus_and_picks_up_new_colors() {
		let mut graph = Graph::load(&topology(6, &[(0, 1), (0, 2)]));
		let mut hl = controller(&graph);
		hl.focus(&graph, NodeId(0));

		graph.apply_infection_snapshot(&snapshot(&[(5, true), (0, true)]));
		let info = hl.refresh(&graph).unwrap();

		let theme = Theme::default();
		assert_eq!(hl.state(), FocusState::Focused(NodeId(0)));
		assert_eq!(hl.style().nodes[0].tier, NodeTier::Focused);
		assert_eq!(hl.style().nodes[5].color, theme.status.infected);
		assert_eq!(hl.style().nodes[5].opacity, theme.emphasis.dimmed_opacity);
		assert_eq!(info.status_label(), "Infected");
	}

	#[test]
	fn unknown_or_isolated_nodes() {
		let graph = Graph::load(&topology(3, &[(0, 1)]));
		let mut hl = controller(&graph);
		assert!(hl.focus(&graph, NodeId(99)).is_none());
		assert_eq!(hl.state(), FocusState::Idle);

		let info = hl.focus(&graph, NodeId(2)).unwrap();
		assert_eq!(info.neighbor_list(), "None");
		assert_eq!(info.status_label(), "Healthy");
	}
}
