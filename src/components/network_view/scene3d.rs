//! 3D scene state: relaxed positions, orbit camera and ray picking.

use std::collections::HashMap;

use super::backend::{InteractiveScene, PointerAction};
use super::camera::OrbitCamera;
use super::geometry::Vec3;
use super::graph::Graph;
use super::highlight::SceneStyle;
use super::scale::NodeSizing;
use super::types::NodeId;

/// Radians of orbit per pixel of drag.
const ROTATE_SPEED: f64 = 0.005;
const CLICK_SLOP: f64 = 3.0;

/// A sphere standing for one node.
#[derive(Clone, Debug, PartialEq)]
pub struct Ball {
	pub id: NodeId,
	pub center: Vec3,
	/// Degree-derived radius before emphasis scaling.
	pub radius: f64,
}

#[derive(Clone, Debug, Default)]
struct OrbitDrag {
	active: bool,
	start_x: f64,
	start_y: f64,
	last_x: f64,
	last_y: f64,
	moved: bool,
}

/// Everything the 3D backend draws and interacts with.
pub struct Scene3D {
	pub camera: OrbitCamera,
	pub style: SceneStyle,
	pub width: f64,
	pub height: f64,
	balls: Vec<Ball>,
	edge_ends: Vec<(usize, usize)>,
	drag: OrbitDrag,
	hovered: Option<NodeId>,
}

impl Scene3D {
	/// Nodes missing from `positions` sit at the origin.
	pub fn new(
		graph: &Graph,
		positions: &HashMap<NodeId, Vec3>,
		sizing: &NodeSizing,
		width: f64,
		height: f64,
		style: SceneStyle,
	) -> Self {
		let balls = graph
			.nodes()
			.iter()
			.map(|n| Ball {
				id: n.id,
				center: positions.get(&n.id).copied().unwrap_or(Vec3::ZERO),
				radius: sizing.radius(n.degree),
			})
			.collect();
		let edge_ends = graph
			.edges()
			.iter()
			.filter_map(|e| Some((graph.index_of(e.source)?, graph.index_of(e.target)?)))
			.collect();
		Self {
			camera: OrbitCamera::default(),
			style,
			width,
			height,
			balls,
			edge_ends,
			drag: OrbitDrag::default(),
			hovered: None,
		}
	}

	pub fn balls(&self) -> &[Ball] {
		&self.balls
	}

	pub fn edge_ends(&self) -> &[(usize, usize)] {
		&self.edge_ends
	}

	/// Radius of ball `index` including its emphasis scale.
	pub fn display_radius(&self, index: usize) -> f64 {
		let scale = self.style.nodes.get(index).map_or(1.0, |a| a.scale);
		self.balls[index].radius * scale
	}

	/// Nearest sphere hit by the ray under the pointer.
	pub fn pick(&self, px: f64, py: f64) -> Option<NodeId> {
		let ray = self.camera.ray_through(px, py, self.width, self.height);
		self.balls
			.iter()
			.enumerate()
			.filter_map(|(i, ball)| {
				ray.intersect_sphere(ball.center, self.display_radius(i))
					.map(|t| (ball.id, t))
			})
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(id, _)| id)
	}

	pub fn pointer_down(&mut self, px: f64, py: f64) {
		self.drag = OrbitDrag {
			active: true,
			start_x: px,
			start_y: py,
			last_x: px,
			last_y: py,
			moved: false,
		};
	}

	/// Orbit while dragging, otherwise report hover changes.
	pub fn pointer_move(&mut self, px: f64, py: f64) -> Option<PointerAction> {
		if self.drag.active {
			let (tx, ty) = (px - self.drag.start_x, py - self.drag.start_y);
			if self.drag.moved || (tx * tx + ty * ty).sqrt() >= CLICK_SLOP {
				self.drag.moved = true;
				let (dx, dy) = (px - self.drag.last_x, py - self.drag.last_y);
				self.camera.orbit(-dx * ROTATE_SPEED, -dy * ROTATE_SPEED);
				self.drag.last_x = px;
				self.drag.last_y = py;
			}
			return None;
		}
		self.set_hover(self.pick(px, py))
	}

	/// Release. A press that never moved over a node is a click on it.
	pub fn pointer_up(&mut self, px: f64, py: f64) -> Option<PointerAction> {
		let drag = std::mem::take(&mut self.drag);
		if !drag.active || drag.moved {
			return None;
		}
		self.pick(px, py).map(PointerAction::Click)
	}

	pub fn pointer_leave(&mut self) -> Option<PointerAction> {
		self.drag = OrbitDrag::default();
		self.set_hover(None)
	}

	fn set_hover(&mut self, node: Option<NodeId>) -> Option<PointerAction> {
		if self.hovered == node {
			return None;
		}
		self.hovered = node;
		Some(PointerAction::Hover(node))
	}

	pub fn wheel(&mut self, delta_y: f64) {
		self.camera.zoom(if delta_y > 0.0 { 1.1 } else { 1.0 / 1.1 });
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Advance camera easing. Returns true while it is still moving.
	pub fn update(&mut self) -> bool {
		self.camera.update()
	}
}

impl InteractiveScene for Scene3D {
	const LABEL: &'static str = "3D";
	const IDLE_CURSOR: &'static str = "default";

	fn press(&mut self, x: f64, y: f64) {
		self.pointer_down(x, y);
	}

	fn drag_to(&mut self, x: f64, y: f64) -> Option<PointerAction> {
		self.pointer_move(x, y)
	}

	fn release(&mut self, x: f64, y: f64) -> Option<PointerAction> {
		self.pointer_up(x, y)
	}

	fn leave(&mut self) -> Option<PointerAction> {
		self.pointer_leave()
	}

	/// Zooms toward the orbit target; the pointer position is ignored.
	fn scroll(&mut self, _x: f64, _y: f64, delta_y: f64) {
		self.wheel(delta_y);
	}

	fn fit(&mut self, width: f64, height: f64) {
		self.resize(width, height);
	}

	fn hover_target(&self) -> Option<NodeId> {
		self.hovered
	}

	fn hit(&self, x: f64, y: f64) -> Option<NodeId> {
		self.pick(x, y)
	}

	fn restyle(&mut self, style: &SceneStyle) {
		self.style = style.clone();
	}
}

/// Linear fog: 0 before `near`, 1 at and beyond `far`.
pub fn fog_factor(depth: f64, near: f64, far: f64) -> f64 {
	if far <= near {
		return if depth >= far { 1.0 } else { 0.0 };
	}
	((depth - near) / (far - near)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_view::graph::tests::topology;
	use crate::components::network_view::scale::ScaleConfig;

	fn scene() -> Scene3D {
		let graph = Graph::load(&topology(3, &[(0, 1)]));
		let positions: HashMap<NodeId, Vec3> = [
			(NodeId(0), Vec3::ZERO),
			(NodeId(1), Vec3::new(0.0, 0.0, -60.0)),
			(NodeId(2), Vec3::new(80.0, 0.0, 0.0)),
		]
		.into_iter()
		.collect();
		Scene3D::new(
			&graph,
			&positions,
			&ScaleConfig::default().node.sizing,
			800.0,
			600.0,
			SceneStyle::default(),
		)
	}

	fn screen_of(scene: &Scene3D, id: NodeId) -> (f64, f64) {
		let ball = scene.balls().iter().find(|b| b.id == id).unwrap();
		let p = scene.camera.project(ball.center, scene.width, scene.height).unwrap();
		(p.x, p.y)
	}

	#[test]
	fn picks_the_nearest_sphere_along_the_ray() {
		let scene = scene();
		let (x, y) = screen_of(&scene, NodeId(0));
		// Node 1 sits behind node 0 from the default vantage point.
		assert_eq!(scene.pick(x, y), Some(NodeId(0)));
		let (x, y) = screen_of(&scene, NodeId(2));
		assert_eq!(scene.pick(x, y), Some(NodeId(2)));
		assert_eq!(scene.pick(5.0, 5.0), None);
	}

	#[test]
	fn click_versus_orbit_drag() {
		let mut scene = scene();
		let (x, y) = screen_of(&scene, NodeId(2));
		scene.pointer_down(x, y);
		assert_eq!(scene.pointer_up(x, y), Some(PointerAction::Click(NodeId(2))));

		let theta = scene.camera.theta;
		scene.pointer_down(x, y);
		scene.pointer_move(x + 50.0, y);
		assert_eq!(scene.pointer_up(x + 50.0, y), None);
		scene.camera.settle();
		assert!((scene.camera.theta - theta).abs() > 0.1);
	}

	#[test]
	fn hover_enters_and_leaves() {
		let mut scene = scene();
		let (x, y) = screen_of(&scene, NodeId(2));
		assert_eq!(scene.pointer_move(x, y), Some(PointerAction::Hover(Some(NodeId(2)))));
		assert_eq!(scene.pointer_move(5.0, 5.0), Some(PointerAction::Hover(None)));
		assert_eq!(scene.pointer_leave(), None);
	}

	#[test]
	fn interactive_calls_orbit_zoom_and_pick() {
		let mut scene = scene();
		let (x, y) = screen_of(&scene, NodeId(2));
		assert_eq!(scene.hit(x, y), Some(NodeId(2)));
		scene.press(x, y);
		assert_eq!(scene.release(x, y), Some(PointerAction::Click(NodeId(2))));
		assert_eq!(scene.drag_to(x, y), Some(PointerAction::Hover(Some(NodeId(2)))));
		assert_eq!(scene.hover_target(), Some(NodeId(2)));

		let distance = scene.camera.distance;
		scene.scroll(x, y, 120.0);
		scene.camera.settle();
		assert!(scene.camera.distance > distance);

		scene.fit(400.0, 300.0);
		assert_eq!((scene.width, scene.height), (400.0, 300.0));
		assert_eq!(scene.leave(), Some(PointerAction::Hover(None)));
		assert_eq!(Scene3D::IDLE_CURSOR, "default");
	}

	#[test]
	fn fog_ramps_between_near_and_far() {
		assert_eq!(fog_factor(100.0, 400.0, 1000.0), 0.0);
		assert_eq!(fog_factor(700.0, 400.0, 1000.0), 0.5);
		assert_eq!(fog_factor(2000.0, 400.0, 1000.0), 1.0);
	}
}
