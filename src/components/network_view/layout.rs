//! Node placement for both views.
//!
//! - [`ForceLayout`] is the live 2D simulation. Charge and spring forces come
//!   from `force_graph`; link rest length, centering and degree-keyed collision
//!   are layered on each tick. It keeps producing positions until it cools
//!   down, and is reheated while the user drags a node.
//! - [`compute_3d`] is a fixed-cost spring relaxation seeded on a sphere shell.
//!   It runs a set number of iterations and returns; there is no convergence
//!   test.
//!
//! Neither layout looks at infection state, so infection updates never move
//! anything.

use std::collections::HashMap;
use std::f64::consts::TAU;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use rand::Rng;
use serde::Deserialize;

use super::geometry::Vec3;
use super::graph::Graph;
use super::scale::NodeSizing;
use super::types::NodeId;

/// Parameters of the 2D force simulation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ForceParams {
	/// Many-body repulsion handed to `force_graph`.
	pub charge: f32,
	/// Spring constant handed to `force_graph`.
	pub spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping: f32,
	/// Rest length of every link in world units.
	pub link_distance: f64,
	/// Fraction of the rest-length error corrected per tick at full heat.
	pub link_strength: f64,
	/// Fraction of the centroid offset removed per tick.
	pub center_strength: f64,
	/// Gap added to the node radius for collision.
	pub collision_padding: f64,
	/// Radius of the circle nodes start on.
	pub initial_radius: f64,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	/// Heat kept while a node is being dragged.
	pub drag_alpha_target: f64,
}

impl Default for ForceParams {
	fn default() -> Self {
		Self {
			charge: 300.0,
			spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping: 0.9,
			link_distance: 50.0,
			link_strength: 0.5,
			center_strength: 1.0,
			collision_padding: 1.0,
			initial_radius: 100.0,
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			alpha_min: 0.001,
			drag_alpha_target: 0.3,
		}
	}
}

/// Per-node payload carried through the physics graph.
#[derive(Clone, Debug)]
pub struct LayoutNode {
	pub id: NodeId,
	/// Collision radius in world units.
	pub collide_radius: f64,
}

struct Body {
	idx: DefaultNodeIdx,
	x: f64,
	y: f64,
	r: f64,
	anchored: bool,
}

/// Share of a pairwise correction each side takes. Anchored bodies take none.
fn split(a: &Body, b: &Body) -> Option<(f64, f64)> {
	match (a.anchored, b.anchored) {
		(true, true) => None,
		(true, false) => Some((0.0, 1.0)),
		(false, true) => Some((1.0, 0.0)),
		(false, false) => Some((0.5, 0.5)),
	}
}

/// Running 2D force simulation over one topology.
pub struct ForceLayout {
	physics: ForceGraph<LayoutNode, ()>,
	handles: HashMap<NodeId, DefaultNodeIdx>,
	links: Vec<(DefaultNodeIdx, DefaultNodeIdx)>,
	center: (f64, f64),
	params: ForceParams,
	alpha: f64,
	alpha_target: f64,
}

impl ForceLayout {
	/// Start a simulation with nodes spread on a circle around `center`.
	pub fn new(graph: &Graph, sizing: &NodeSizing, center: (f64, f64), params: ForceParams) -> Self {
		let mut physics = ForceGraph::new(SimulationParameters {
			force_charge: params.charge,
			force_spring: params.spring,
			force_max: params.force_max,
			node_speed: params.node_speed,
			damping_factor: params.damping,
		});
		let total = graph.node_count().max(1) as f64;
		let mut handles = HashMap::with_capacity(graph.node_count());

		for (i, node) in graph.nodes().iter().enumerate() {
			let angle = (i as f64) * TAU / total;
			let idx = physics.add_node(NodeData {
				x: (center.0 + params.initial_radius * angle.cos()) as f32,
				y: (center.1 + params.initial_radius * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: LayoutNode {
					id: node.id,
					collide_radius: sizing.radius(node.degree) + params.collision_padding,
				},
			});
			handles.insert(node.id, idx);
		}

		let mut links = Vec::with_capacity(graph.edge_count());
		for edge in graph.edges() {
			if let (Some(&src), Some(&tgt)) = (handles.get(&edge.source), handles.get(&edge.target)) {
				physics.add_edge(src, tgt, EdgeData::default());
				links.push((src, tgt));
			}
		}

		Self {
			physics,
			handles,
			links,
			center,
			params,
			alpha: 1.0,
			alpha_target: 0.0,
		}
	}

	/// Current simulation heat.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// True once the simulation has cooled and is not being held warm.
	pub fn is_stable(&self) -> bool {
		self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
	}

	/// Advance one tick. Returns `false` when the layout is stable and nothing moved.
	pub fn tick(&mut self, dt: f32) -> bool {
		if self.is_stable() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		self.physics.update(dt);
		self.apply_constraints();
		true
	}

	/// Link rest length, collision and centering, computed from one snapshot.
	fn apply_constraints(&mut self) {
		let mut bodies = Vec::with_capacity(self.handles.len());
		self.physics.visit_nodes(|node| {
			bodies.push(Body {
				idx: node.index(),
				x: node.x() as f64,
				y: node.y() as f64,
				r: node.data.user_data.collide_radius,
				anchored: node.data.is_anchor,
			});
		});
		if bodies.is_empty() {
			return;
		}
		let slot: HashMap<DefaultNodeIdx, usize> =
			bodies.iter().enumerate().map(|(i, b)| (b.idx, i)).collect();
		let mut shift = vec![(0.0f64, 0.0f64); bodies.len()];

		let pull = self.params.link_strength * self.alpha;
		for &(a, b) in &self.links {
			let (Some(&ia), Some(&ib)) = (slot.get(&a), slot.get(&b)) else {
				continue;
			};
			let Some((wa, wb)) = split(&bodies[ia], &bodies[ib]) else {
				continue;
			};
			let (dx, dy) = (bodies[ib].x - bodies[ia].x, bodies[ib].y - bodies[ia].y);
			let dist = (dx * dx + dy * dy).sqrt().max(1.0);
			let k = (dist - self.params.link_distance) / dist * pull;
			shift[ia].0 += dx * k * wa;
			shift[ia].1 += dy * k * wa;
			shift[ib].0 -= dx * k * wb;
			shift[ib].1 -= dy * k * wb;
		}

		for i in 0..bodies.len() {
			for j in (i + 1)..bodies.len() {
				let Some((wi, wj)) = split(&bodies[i], &bodies[j]) else {
					continue;
				};
				let min_dist = bodies[i].r + bodies[j].r;
				let (mut dx, mut dy) = (bodies[j].x - bodies[i].x, bodies[j].y - bodies[i].y);
				let dist_sq = dx * dx + dy * dy;
				if dist_sq >= min_dist * min_dist {
					continue;
				}
				let mut dist = dist_sq.sqrt();
				if dist < 1e-6 {
					// Coincident: separate along a direction derived from the pair.
					let angle = (i * 31 + j * 17) as f64;
					(dx, dy, dist) = (angle.cos(), angle.sin(), 1.0);
				}
				let push = (min_dist - dist) / dist;
				shift[i].0 -= dx * push * wi;
				shift[i].1 -= dy * push * wi;
				shift[j].0 += dx * push * wj;
				shift[j].1 += dy * push * wj;
			}
		}

		let n = bodies.len() as f64;
		let (mx, my) = bodies
			.iter()
			.fold((0.0, 0.0), |(sx, sy), b| (sx + b.x, sy + b.y));
		let center_dx = (self.center.0 - mx / n) * self.params.center_strength;
		let center_dy = (self.center.1 - my / n) * self.params.center_strength;

		self.physics.visit_nodes_mut(|node| {
			let Some(&i) = slot.get(&node.index()) else {
				return;
			};
			if !bodies[i].anchored {
				node.data.x = (bodies[i].x + shift[i].0 + center_dx) as f32;
				node.data.y = (bodies[i].y + shift[i].1 + center_dy) as f32;
			}
		});
	}

	/// Move the centering target, e.g. after the canvas is resized.
	pub fn set_center(&mut self, center: (f64, f64)) {
		self.center = center;
		self.reheat_once();
	}

	/// Fix `id` at `(x, y)` until [`ForceLayout::release`] and keep the simulation warm.
	pub fn pin(&mut self, id: NodeId, x: f64, y: f64) {
		let Some(&target) = self.handles.get(&id) else {
			return;
		};
		self.physics.visit_nodes_mut(|node| {
			if node.index() == target {
				node.data.x = x as f32;
				node.data.y = y as f32;
				node.data.is_anchor = true;
			}
		});
		self.alpha_target = self.params.drag_alpha_target;
		if self.alpha < self.alpha_target {
			self.alpha = self.alpha_target;
		}
	}

	/// Let a pinned node rejoin the simulation and allow it to cool again.
	pub fn release(&mut self, id: NodeId) {
		let Some(&target) = self.handles.get(&id) else {
			return;
		};
		self.physics.visit_nodes_mut(|node| {
			if node.index() == target {
				node.data.is_anchor = false;
			}
		});
		self.alpha_target = 0.0;
	}

	pub fn is_pinned(&self, id: NodeId) -> bool {
		let Some(&target) = self.handles.get(&id) else {
			return false;
		};
		let mut pinned = false;
		self.physics.visit_nodes(|node| {
			if node.index() == target {
				pinned = node.data.is_anchor;
			}
		});
		pinned
	}

	fn reheat_once(&mut self) {
		if self.alpha < self.params.drag_alpha_target {
			self.alpha = self.params.drag_alpha_target;
		}
	}

	/// Current position of every node.
	pub fn positions(&self) -> HashMap<NodeId, (f64, f64)> {
		let mut out = HashMap::with_capacity(self.handles.len());
		self.physics.visit_nodes(|node| {
			out.insert(node.data.user_data.id, (node.x() as f64, node.y() as f64));
		});
		out
	}

	pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
		let target = *self.handles.get(&id)?;
		let mut found = None;
		self.physics.visit_nodes(|node| {
			if node.index() == target {
				found = Some((node.x() as f64, node.y() as f64));
			}
		});
		found
	}
}

/// Parameters of the 3D spring relaxation.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RelaxationParams {
	/// Radius of the sphere shell nodes are seeded on.
	pub shell_radius: f64,
	pub iterations: usize,
	/// Spring force per unit of distance (rest length is zero).
	pub stiffness: f64,
	/// Damping at iteration 0; decays linearly to 0 at the last iteration.
	pub initial_damping: f64,
}

impl Default for RelaxationParams {
	fn default() -> Self {
		Self {
			shell_radius: 120.0,
			iterations: 12,
			stiffness: 0.015,
			initial_damping: 0.4,
		}
	}
}

impl RelaxationParams {
	/// Damping factor applied during iteration `iter`.
	pub fn damping_at(&self, iter: usize) -> f64 {
		if self.iterations == 0 {
			return 0.0;
		}
		self.initial_damping * (1.0 - iter as f64 / self.iterations as f64)
	}
}

/// Uniform random points on a sphere shell, one per node in graph order.
pub fn seed_shell<R: Rng + ?Sized>(graph: &Graph, radius: f64, rng: &mut R) -> Vec<Vec3> {
	graph
		.nodes()
		.iter()
		.map(|_| {
			let theta = rng.gen_range(0.0..TAU);
			let phi = (2.0 * rng.gen_range(0.0..1.0) - 1.0_f64).acos();
			Vec3::new(
				radius * phi.sin() * theta.cos(),
				radius * phi.sin() * theta.sin(),
				radius * phi.cos(),
			)
		})
		.collect()
}

/// Run the fixed number of spring iterations over `positions` (graph order).
pub fn relax(graph: &Graph, positions: &mut [Vec3], params: &RelaxationParams) {
	let ends: Vec<(usize, usize)> = graph
		.edges()
		.iter()
		.filter_map(|e| Some((graph.index_of(e.source)?, graph.index_of(e.target)?)))
		.collect();
	let mut velocity = vec![Vec3::ZERO; positions.len()];

	for iter in 0..params.iterations {
		velocity.iter_mut().for_each(|v| *v = Vec3::ZERO);

		for &(s, t) in &ends {
			let delta = positions[t] - positions[s];
			let mut dist = delta.length();
			if dist == 0.0 {
				dist = 1.0;
			}
			let force = dist * params.stiffness;
			let pull = delta * (force / dist);
			velocity[s] = velocity[s] + pull;
			velocity[t] = velocity[t] - pull;
		}

		let damping = params.damping_at(iter);
		for (p, v) in positions.iter_mut().zip(&velocity) {
			*p = *p + *v * damping;
		}
	}
}

/// Seed on a shell and relax. Output differs between calls with different RNG state.
pub fn compute_3d<R: Rng + ?Sized>(
	graph: &Graph,
	params: &RelaxationParams,
	rng: &mut R,
) -> HashMap<NodeId, Vec3> {
	let mut positions = seed_shell(graph, params.shell_radius, rng);
	relax(graph, &mut positions, params);
	graph
		.nodes()
		.iter()
		.zip(positions)
		.map(|(node, p)| (node.id, p))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_view::graph::tests::topology;
	use crate::components::network_view::scale::ScaleConfig;
	use rand::SeedableRng;
	use rand::rngs::SmallRng;

	fn star() -> Graph {
		Graph::load(&topology(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]))
	}

	#[test]
	fn relaxation_places_every_node() {
		let graph = star();
		let mut rng = SmallRng::seed_from_u64(7);
		let positions = compute_3d(&graph, &RelaxationParams::default(), &mut rng);
		assert_eq!(positions.len(), 5);
		assert!(positions.values().all(|p| p.is_finite()));
	}

	#[test]
	fn seeds_lie_on_the_shell() {
		let graph = star();
		let mut rng = SmallRng::seed_from_u64(1);
		for p in seed_shell(&graph, 120.0, &mut rng) {
			assert!((p.length() - 120.0).abs() < 1e-6);
		}
	}

	#[test]
	fn distinct_nodes_rarely_share_a_position() {
		let graph = Graph::load(&topology(
			40,
			&(1..40).map(|i| (i / 2, i)).collect::<Vec<_>>(),
		));
		let mut duplicates = 0usize;
		for seed in 0..200 {
			let mut rng = SmallRng::seed_from_u64(seed);
			let positions: Vec<Vec3> = compute_3d(&graph, &RelaxationParams::default(), &mut rng)
				.into_values()
				.collect();
			for i in 0..positions.len() {
				for j in (i + 1)..positions.len() {
					if (positions[i] - positions[j]).length() < 1e-9 {
						duplicates += 1;
					}
				}
			}
		}
		assert_eq!(duplicates, 0);
	}

	#[test]
	fn output_varies_with_seed() {
		let graph = star();
		let a = compute_3d(&graph, &RelaxationParams::default(), &mut SmallRng::seed_from_u64(1));
		let b = compute_3d(&graph, &RelaxationParams::default(), &mut SmallRng::seed_from_u64(2));
		assert_ne!(a[&NodeId(0)], b[&NodeId(0)]);
	}

	#[test]
	fn coincident_endpoints_stay_finite() {
		let graph = star();
		let params = RelaxationParams {
			shell_radius: 0.0,
			..Default::default()
		};
		let positions = compute_3d(&graph, &params, &mut SmallRng::seed_from_u64(3));
		for p in positions.values() {
			assert!(p.is_finite());
			assert_eq!(*p, Vec3::ZERO);
		}
	}

	#[test]
	fn springs_pull_linked_nodes_together() {
		let graph = Graph::load(&topology(3, &[(0, 1)]));
		let mut rng = SmallRng::seed_from_u64(11);
		let mut positions = seed_shell(&graph, 120.0, &mut rng);
		let before = (positions[0] - positions[1]).length();
		let isolated = positions[2];

		relax(&graph, &mut positions, &RelaxationParams::default());

		assert!((positions[0] - positions[1]).length() < before);
		assert_eq!(positions[2], isolated);
	}

	#[test]
	fn damping_decays_linearly_to_zero() {
		let params = RelaxationParams::default();
		assert_eq!(params.damping_at(0), 0.4);
		assert!((params.damping_at(6) - 0.2).abs() < 1e-12);
		assert_eq!(params.damping_at(12), 0.0);
	}

	fn force_layout(graph: &Graph) -> ForceLayout {
		let sizing = ScaleConfig::default().node.sizing;
		ForceLayout::new(graph, &sizing, (400.0, 300.0), ForceParams::default())
	}

	#[test]
	fn force_layout_positions_every_node_around_center() {
		let graph = star();
		let layout = force_layout(&graph);
		let positions = layout.positions();
		assert_eq!(positions.len(), 5);
		for &(x, y) in positions.values() {
			let r = ((x - 400.0).powi(2) + (y - 300.0).powi(2)).sqrt();
			assert!((r - 100.0).abs() < 1e-3);
		}
	}

	#[test]
	fn force_layout_cools_down_and_stops() {
		let graph = star();
		let mut layout = force_layout(&graph);
		assert!(!layout.is_stable());
		let mut ticks = 0;
		while layout.tick(0.016) {
			ticks += 1;
			assert!(ticks < 1000, "simulation never stabilised");
		}
		assert!(layout.is_stable());
		let frozen = layout.positions();
		assert!(!layout.tick(0.016));
		assert_eq!(frozen, layout.positions());
	}

	#[test]
	fn pinned_node_holds_position_until_released() {
		let graph = star();
		let mut layout = force_layout(&graph);
		layout.pin(NodeId(2), 10.0, 20.0);
		for _ in 0..20 {
			layout.tick(0.016);
		}
		assert_eq!(layout.position(NodeId(2)), Some((10.0, 20.0)));
		assert!(layout.is_pinned(NodeId(2)));
		assert!(layout.alpha() >= 0.29);

		layout.release(NodeId(2));
		assert!(!layout.is_pinned(NodeId(2)));
		layout.tick(0.016);
		assert_ne!(layout.position(NodeId(2)), Some((10.0, 20.0)));
	}

	#[test]
	fn overlapping_nodes_are_pushed_apart() {
		let graph = Graph::load(&topology(2, &[]));
		let mut layout = force_layout(&graph);
		layout.pin(NodeId(0), 398.5, 300.0);
		layout.pin(NodeId(1), 401.5, 300.0);
		layout.release(NodeId(1));
		layout.tick(0.016);
		let (x, y) = layout.position(NodeId(1)).unwrap();
		assert!(x.is_finite() && y.is_finite());
		assert!(x - 398.5 > 3.0);
	}

	#[test]
	fn pinned_node_is_not_pushed_by_overlap() {
		let graph = Graph::load(&topology(2, &[(0, 1)]));
		let mut layout = force_layout(&graph);
		layout.pin(NodeId(0), 398.5, 300.0);
		layout.pin(NodeId(1), 400.0, 300.0);
		layout.release(NodeId(1));
		for _ in 0..5 {
			layout.tick(0.016);
		}
		assert_eq!(layout.position(NodeId(0)), Some((398.5, 300.0)));
		let (x, _) = layout.position(NodeId(1)).unwrap();
		assert!(x > 400.0);
	}

	#[test]
	fn anchored_side_takes_no_share_of_a_correction() {
		let body = |anchored| Body {
			idx: DefaultNodeIdx::new(0),
			x: 0.0,
			y: 0.0,
			r: 1.0,
			anchored,
		};
		assert_eq!(split(&body(false), &body(false)), Some((0.5, 0.5)));
		assert_eq!(split(&body(true), &body(false)), Some((0.0, 1.0)));
		assert_eq!(split(&body(false), &body(true)), Some((1.0, 0.0)));
		assert_eq!(split(&body(true), &body(true)), None);
	}
}
