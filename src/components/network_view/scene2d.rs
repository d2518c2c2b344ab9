//! 2D scene state: live layout, pan/zoom transform and pointer tracking.
//!
//! Everything here is plain data so it can be driven without a canvas. The
//! browser backend feeds it pointer events and hands it to the renderer every
//! frame.

use super::backend::{InteractiveScene, PointerAction};
use super::graph::Graph;
use super::highlight::SceneStyle;
use super::layout::{ForceLayout, ForceParams};
use super::scale::{ScaleConfig, ScaledValues};
use super::types::NodeId;

/// Pointer travel (pixels) below which a press/release counts as a click.
const CLICK_SLOP: f64 = 3.0;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

/// Tracks an in-progress node drag operation.
#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<NodeId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

/// Tracks an in-progress canvas pan operation.
#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// One drawable node.
#[derive(Clone, Debug)]
pub struct Sprite {
	pub id: NodeId,
	/// Degree-derived radius in world units.
	pub radius: f64,
}

/// A node resolved for drawing.
#[derive(Clone, Copy, Debug)]
pub struct PlacedNode {
	pub index: usize,
	pub x: f64,
	pub y: f64,
	pub radius: f64,
}

/// Everything the 2D backend draws and interacts with.
pub struct Scene2D {
	pub layout: ForceLayout,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub config: ScaleConfig,
	pub style: SceneStyle,
	pub width: f64,
	pub height: f64,
	sprites: Vec<Sprite>,
	edge_ends: Vec<(usize, usize)>,
	hovered: Option<NodeId>,
}

impl Scene2D {
	pub fn new(
		graph: &Graph,
		width: f64,
		height: f64,
		config: ScaleConfig,
		params: ForceParams,
		style: SceneStyle,
	) -> Self {
		let layout = ForceLayout::new(graph, &config.node.sizing, (0.0, 0.0), params);
		let sprites = graph
			.nodes()
			.iter()
			.map(|n| Sprite {
				id: n.id,
				radius: config.node.sizing.radius(n.degree),
			})
			.collect();
		let edge_ends = graph
			.edges()
			.iter()
			.filter_map(|e| Some((graph.index_of(e.source)?, graph.index_of(e.target)?)))
			.collect();
		Self {
			layout,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			config,
			style,
			width,
			height,
			sprites,
			edge_ends,
			hovered: None,
		}
	}

	pub fn sprites(&self) -> &[Sprite] {
		&self.sprites
	}

	/// Edge endpoints as indices into [`Scene2D::sprites`], in graph edge order.
	pub fn edge_ends(&self) -> &[(usize, usize)] {
		&self.edge_ends
	}

	pub fn scaled(&self) -> ScaledValues {
		ScaledValues::new(&self.config, 1.5, self.transform.k)
	}

	/// Current node positions and emphasized radii, in sprite order.
	pub fn placed(&self) -> Vec<PlacedNode> {
		let positions = self.layout.positions();
		let scaled = self.scaled();
		self.sprites
			.iter()
			.enumerate()
			.filter_map(|(index, sprite)| {
				let &(x, y) = positions.get(&sprite.id)?;
				let emphasis = self.style.nodes.get(index).map_or(1.0, |a| a.scale);
				Some(PlacedNode {
					index,
					x,
					y,
					radius: scaled.node_radius(&self.config, sprite.radius) * emphasis,
				})
			})
			.collect()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost node whose disc (plus pick slop) contains the screen point.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let slop = self.scaled().hit_slop;
		let mut found: Option<(NodeId, f64)> = None;
		for placed in self.placed() {
			let (dx, dy) = (placed.x - gx, placed.y - gy);
			let dist = (dx * dx + dy * dy).sqrt();
			if dist <= placed.radius + slop && found.is_none_or(|(_, best)| dist < best) {
				found = Some((self.sprites[placed.index].id, dist));
			}
		}
		found.map(|(id, _)| id)
	}

	pub fn tick(&mut self, dt: f32) -> bool {
		self.layout.tick(dt)
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.transform.x += (width - self.width) / 2.0;
		self.transform.y += (height - self.height) / 2.0;
		self.width = width;
		self.height = height;
	}

	/// Press: grab the node under the pointer, or start panning.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		match self.node_at(sx, sy) {
			Some(id) => {
				let (nx, ny) = self.layout.position(id).unwrap_or_else(|| self.screen_to_graph(sx, sy));
				self.drag = DragState {
					node: Some(id),
					start_x: sx,
					start_y: sy,
					node_start_x: nx,
					node_start_y: ny,
					moved: false,
				};
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
				};
			}
		}
	}

	/// Move: drag, pan, or report a hover change.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> Option<PointerAction> {
		if let Some(id) = self.drag.node {
			let (dx, dy) = (sx - self.drag.start_x, sy - self.drag.start_y);
			if !self.drag.moved && (dx * dx + dy * dy).sqrt() < CLICK_SLOP {
				return None;
			}
			self.drag.moved = true;
			self.layout.pin(
				id,
				self.drag.node_start_x + dx / self.transform.k,
				self.drag.node_start_y + dy / self.transform.k,
			);
			return None;
		}
		if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			return None;
		}
		self.set_hover(self.node_at(sx, sy))
	}

	/// Release: end a drag (unpinning the node) or pan. A press that never
	/// moved is a click.
	pub fn pointer_up(&mut self) -> Option<PointerAction> {
		self.pan.active = false;
		let drag = std::mem::take(&mut self.drag);
		let id = drag.node?;
		if drag.moved {
			self.layout.release(id);
			None
		} else {
			Some(PointerAction::Click(id))
		}
	}

	/// Pointer left the canvas: cancel gestures and clear hover.
	pub fn pointer_leave(&mut self) -> Option<PointerAction> {
		if let Some(id) = self.drag.node.take() {
			self.layout.release(id);
		}
		self.drag = DragState::default();
		self.pan.active = false;
		self.set_hover(None)
	}

	fn set_hover(&mut self, node: Option<NodeId>) -> Option<PointerAction> {
		if self.hovered == node {
			return None;
		}
		self.hovered = node;
		Some(PointerAction::Hover(node))
	}

	/// Zoom around a screen point. Data coordinates are untouched.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let (min_k, max_k) = self.config.zoom_range;
		let new_k = (self.transform.k * factor).clamp(min_k, max_k);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}
}

impl InteractiveScene for Scene2D {
	const LABEL: &'static str = "2D";
	const IDLE_CURSOR: &'static str = "grab";

	fn press(&mut self, x: f64, y: f64) {
		self.pointer_down(x, y);
	}

	fn drag_to(&mut self, x: f64, y: f64) -> Option<PointerAction> {
		self.pointer_move(x, y)
	}

	fn release(&mut self, _x: f64, _y: f64) -> Option<PointerAction> {
		self.pointer_up()
	}

	fn leave(&mut self) -> Option<PointerAction> {
		self.pointer_leave()
	}

	fn scroll(&mut self, x: f64, y: f64, delta_y: f64) {
		self.zoom_at(x, y, delta_y);
	}

	fn fit(&mut self, width: f64, height: f64) {
		self.resize(width, height);
	}

	fn hover_target(&self) -> Option<NodeId> {
		self.hovered
	}

	fn hit(&self, x: f64, y: f64) -> Option<NodeId> {
		self.node_at(x, y)
	}

	fn restyle(&mut self, style: &SceneStyle) {
		self.style = style.clone();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::network_view::graph::tests::topology;
	use crate::components::network_view::highlight::HighlightController;
	use crate::components::network_view::theme::Theme;

	fn scene() -> Scene2D {
		let graph = Graph::load(&topology(4, &[(0, 1), (1, 2), (2, 3)]));
		Scene2D::new(
			&graph,
			800.0,
			600.0,
			ScaleConfig::default(),
			ForceParams::default(),
			SceneStyle::default(),
		)
	}

	fn screen_of(scene: &Scene2D, id: NodeId) -> (f64, f64) {
		let (x, y) = scene.layout.position(id).unwrap();
		(
			x * scene.transform.k + scene.transform.x,
			y * scene.transform.k + scene.transform.y,
		)
	}

	#[test]
	fn picks_node_under_pointer() {
		let scene = scene();
		let (sx, sy) = screen_of(&scene, NodeId(2));
		assert_eq!(scene.node_at(sx, sy), Some(NodeId(2)));
		assert_eq!(scene.node_at(sx + 30.0, sy + 30.0), None);
	}

	#[test]
	fn interactive_calls_drive_hover_click_and_style() {
		let mut scene = scene();
		let (sx, sy) = screen_of(&scene, NodeId(0));
		assert_eq!(scene.hit(sx, sy), Some(NodeId(0)));
		assert_eq!(
			InteractiveScene::drag_to(&mut scene, sx, sy),
			Some(PointerAction::Hover(Some(NodeId(0))))
		);
		assert_eq!(scene.hover_target(), Some(NodeId(0)));
		scene.press(sx, sy);
		assert_eq!(scene.release(sx, sy), Some(PointerAction::Click(NodeId(0))));
		assert_eq!(scene.leave(), Some(PointerAction::Hover(None)));
		assert_eq!(scene.hover_target(), None);

		let graph = Graph::load(&topology(4, &[(0, 1), (1, 2), (2, 3)]));
		let mut highlight = HighlightController::new(&Theme::default());
		highlight.focus(&graph, NodeId(2));
		scene.restyle(highlight.style());
		assert_eq!(&scene.style, highlight.style());
		assert_eq!(Scene2D::IDLE_CURSOR, "grab");
	}

	#[test]
	fn press_without_motion_is_a_click() {
		let mut scene = scene();
		let (sx, sy) = screen_of(&scene, NodeId(1));
		scene.pointer_down(sx, sy);
		assert_eq!(scene.pointer_move(sx + 1.0, sy), None);
		assert_eq!(scene.pointer_up(), Some(PointerAction::Click(NodeId(1))));
		assert!(!scene.layout.is_pinned(NodeId(1)));
	}

	#[test]
	fn drag_pins_then_release_unpins() {
		let mut scene = scene();
		let (sx, sy) = screen_of(&scene, NodeId(3));
		let (wx, wy) = scene.layout.position(NodeId(3)).unwrap();
		scene.pointer_down(sx, sy);
		scene.pointer_move(sx + 40.0, sy - 20.0);

		assert!(scene.layout.is_pinned(NodeId(3)));
		let (px, py) = scene.layout.position(NodeId(3)).unwrap();
		assert!((px - (wx + 40.0)).abs() < 1e-3);
		assert!((py - (wy - 20.0)).abs() < 1e-3);

		assert_eq!(scene.pointer_up(), None);
		assert!(!scene.layout.is_pinned(NodeId(3)));
	}

	#[test]
	fn hover_reports_only_changes() {
		let mut scene = scene();
		let (sx, sy) = screen_of(&scene, NodeId(0));
		assert_eq!(
			scene.pointer_move(sx, sy),
			Some(PointerAction::Hover(Some(NodeId(0))))
		);
		assert_eq!(scene.pointer_move(sx + 0.5, sy), None);
		assert_eq!(scene.pointer_leave(), Some(PointerAction::Hover(None)));
	}

	#[test]
	fn pan_and_zoom_leave_data_coordinates_alone() {
		let mut scene = scene();
		let before = scene.layout.positions();
		scene.pointer_down(5.0, 5.0);
		scene.pointer_move(55.0, 25.0);
		scene.pointer_up();
		assert_eq!(scene.transform.x, 450.0);
		assert_eq!(scene.transform.y, 320.0);

		scene.zoom_at(100.0, 100.0, -1.0);
		assert!((scene.transform.k - 1.1).abs() < 1e-12);
		for _ in 0..100 {
			scene.zoom_at(0.0, 0.0, 1.0);
		}
		assert_eq!(scene.transform.k, 0.1);
		assert_eq!(scene.layout.positions(), before);
	}
}
