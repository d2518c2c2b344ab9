//! Browser 2D backend: force layout drawn on a canvas with pan, zoom and drag.

use log::debug;
use web_sys::HtmlElement;

use super::backend::{BackendKind, PointerPosition, PointerSink, RenderBackend};
use super::dom::{self, MountedCanvas};
use super::error::EngineError;
use super::graph::Graph;
use super::highlight::SceneStyle;
use super::layout::ForceParams;
use super::render;
use super::scale::ScaleConfig;
use super::scene2d::Scene2D;
use super::theme::Theme;
use super::types::NodeId;

/// The TwoD [`RenderBackend`].
pub struct Canvas2dBackend {
	container: HtmlElement,
	sink: PointerSink,
	theme: Theme,
	scale: ScaleConfig,
	force: ForceParams,
	height: f64,
	mounted: Option<MountedCanvas<Scene2D>>,
}

impl Canvas2dBackend {
	pub fn new(
		container: HtmlElement,
		sink: PointerSink,
		theme: Theme,
		force: ForceParams,
		height: f64,
	) -> Self {
		Self {
			container,
			sink,
			theme,
			scale: ScaleConfig::default(),
			force,
			height,
			mounted: None,
		}
	}
}

impl RenderBackend for Canvas2dBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::TwoD
	}

	fn mount(&mut self, graph: &Graph, style: &SceneStyle) -> Result<(), EngineError> {
		self.teardown();
		self.container.set_inner_html("");

		let (canvas, ctx) = dom::create_canvas(&self.container, self.height)?;
		let scene = Scene2D::new(
			graph,
			canvas.width() as f64,
			canvas.height() as f64,
			self.scale.clone(),
			self.force.clone(),
			style.clone(),
		);

		let theme = self.theme.clone();
		let mounted = MountedCanvas::start(&self.container, canvas, scene, &self.sink, move |scene| {
			scene.tick(0.016);
			if let Err(e) = render::render(scene, &ctx, &theme) {
				debug!("epidemic-view: 2D frame failed: {e:?}");
			}
		})?;

		debug!(
			"epidemic-view: 2D view mounted ({} nodes, {} edges)",
			graph.node_count(),
			graph.edge_count()
		);
		self.mounted = Some(mounted);
		Ok(())
	}

	fn pick(&self, pointer: PointerPosition) -> Option<NodeId> {
		self.mounted.as_ref()?.pick(pointer)
	}

	fn recolor(&mut self, style: &SceneStyle) {
		if let Some(mounted) = &self.mounted {
			mounted.recolor(style);
		}
	}

	fn teardown(&mut self) {
		if let Some(mounted) = self.mounted.take() {
			mounted.remove();
		}
	}

	fn is_mounted(&self) -> bool {
		self.mounted.is_some()
	}
}
