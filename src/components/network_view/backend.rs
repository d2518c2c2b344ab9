//! The render backend seam.
//!
//! The session only ever talks to a `Box<dyn RenderBackend>`; which variant
//! sits behind it is decided by a [`BackendFactory`].

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use super::error::EngineError;
use super::graph::Graph;
use super::highlight::SceneStyle;
use super::types::NodeId;

/// Which view is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	#[default]
	TwoD,
	ThreeD,
}

impl fmt::Display for BackendKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			BackendKind::TwoD => "2D",
			BackendKind::ThreeD => "3D",
		})
	}
}

/// Pointer location in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerPosition {
	pub x: f64,
	pub y: f64,
}

/// Interaction a backend reports after hit-testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerAction {
	/// The node under the pointer changed; `None` when it left every node.
	Hover(Option<NodeId>),
	/// A node was clicked without dragging.
	Click(NodeId),
}

/// Where backends deliver pointer actions.
pub type PointerSink = Rc<dyn Fn(PointerAction)>;

/// A mounted view of the graph.
///
/// A backend owns every rendering resource it creates (canvas, context,
/// animation loop, listeners). `teardown` must release all of them and is
/// safe to call more than once.
pub trait RenderBackend {
	fn kind(&self) -> BackendKind;

	/// Clear prior content, lay out `graph` and start drawing it in `style`.
	///
	/// On error nothing stays mounted.
	fn mount(&mut self, graph: &Graph, style: &SceneStyle) -> Result<(), EngineError>;

	/// Node under `pointer`, if any.
	///
	/// Hover and click already reach the session through the [`PointerSink`];
	/// this is the on-demand hit test for the host, e.g. tooltips.
	fn pick(&self, pointer: PointerPosition) -> Option<NodeId>;

	/// Take new colors and emphasis. Never moves anything.
	fn recolor(&mut self, style: &SceneStyle);

	fn teardown(&mut self);

	fn is_mounted(&self) -> bool;
}

/// Builds backends for the session.
pub trait BackendFactory {
	fn create(&self, kind: BackendKind, sink: PointerSink) -> Box<dyn RenderBackend>;
}

/// The interactive half of a canvas scene, in canvas pixels.
///
/// Canvas backends wire DOM input to these calls and forward whatever
/// actions come back to their [`PointerSink`].
pub(crate) trait InteractiveScene {
	/// Name used in log lines.
	const LABEL: &'static str;
	/// Cursor while no node is hovered.
	const IDLE_CURSOR: &'static str;

	fn press(&mut self, x: f64, y: f64);
	fn drag_to(&mut self, x: f64, y: f64) -> Option<PointerAction>;
	fn release(&mut self, x: f64, y: f64) -> Option<PointerAction>;
	fn leave(&mut self) -> Option<PointerAction>;
	fn scroll(&mut self, x: f64, y: f64, delta_y: f64);
	fn fit(&mut self, width: f64, height: f64);
	fn hover_target(&self) -> Option<NodeId>;
	fn hit(&self, x: f64, y: f64) -> Option<NodeId>;
	fn restyle(&mut self, style: &SceneStyle);
}

#[cfg(test)]
pub(crate) mod tests {
	use std::cell::{Cell, RefCell};

	use super::*;

	/// Calls observed by a [`RecordingBackend`].
	#[derive(Clone, Debug, PartialEq)]
	pub(crate) enum Call {
		Mount { kind: BackendKind, nodes: usize },
		Recolor(SceneStyle),
		Teardown(BackendKind),
	}

	/// In-memory backend that logs every call into a shared journal.
	pub(crate) struct RecordingBackend {
		pub kind: BackendKind,
		pub journal: Rc<RefCell<Vec<Call>>>,
		pub fail_mount: bool,
		pub mounted: bool,
		pub style: SceneStyle,
		pub ids: Vec<NodeId>,
	}

	impl RenderBackend for RecordingBackend {
		fn kind(&self) -> BackendKind {
			self.kind
		}

		fn mount(&mut self, graph: &Graph, style: &SceneStyle) -> Result<(), EngineError> {
			if self.fail_mount {
				return Err(EngineError::RenderSetup("no context".into()));
			}
			self.mounted = true;
			self.style = style.clone();
			self.ids = graph.nodes().iter().map(|n| n.id).collect();
			self.journal.borrow_mut().push(Call::Mount {
				kind: self.kind,
				nodes: graph.node_count(),
			});
			Ok(())
		}

		/// Pretends node `i` sits at `x = i`.
		fn pick(&self, pointer: PointerPosition) -> Option<NodeId> {
			if !self.mounted || pointer.x < 0.0 {
				return None;
			}
			self.ids.get(pointer.x.round() as usize).copied()
		}

		fn recolor(&mut self, style: &SceneStyle) {
			self.style = style.clone();
			self.journal.borrow_mut().push(Call::Recolor(style.clone()));
		}

		fn teardown(&mut self) {
			if self.mounted {
				self.mounted = false;
				self.journal.borrow_mut().push(Call::Teardown(self.kind));
			}
		}

		fn is_mounted(&self) -> bool {
			self.mounted
		}
	}

	/// Factory handing out [`RecordingBackend`]s that share one journal.
	#[derive(Default)]
	pub(crate) struct RecordingFactory {
		pub journal: Rc<RefCell<Vec<Call>>>,
		pub fail_mount: Rc<Cell<bool>>,
		pub sinks: Rc<RefCell<Vec<PointerSink>>>,
	}

	impl BackendFactory for RecordingFactory {
		fn create(&self, kind: BackendKind, sink: PointerSink) -> Box<dyn RenderBackend> {
			self.sinks.borrow_mut().push(sink);
			Box::new(RecordingBackend {
				kind,
				journal: self.journal.clone(),
				fail_mount: self.fail_mount.get(),
				mounted: false,
				style: SceneStyle::default(),
				ids: Vec::new(),
			})
		}
	}

	#[test]
	fn kind_parses_snake_case() {
		let kind: BackendKind = serde_json::from_str("\"three_d\"").unwrap();
		assert_eq!(kind, BackendKind::ThreeD);
		assert_eq!(kind.to_string(), "3D");
	}
}
