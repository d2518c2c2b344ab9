//! Browser 3D backend: relaxed sphere layout seen through an orbit camera.

use log::debug;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use web_sys::HtmlElement;

use super::backend::{BackendKind, PointerPosition, PointerSink, RenderBackend};
use super::dom::{self, MountedCanvas};
use super::error::EngineError;
use super::graph::Graph;
use super::highlight::SceneStyle;
use super::layout::{RelaxationParams, compute_3d};
use super::render3d;
use super::scale::ScaleConfig;
use super::scene3d::Scene3D;
use super::theme::Theme;
use super::types::NodeId;

/// The ThreeD [`RenderBackend`].
pub struct Canvas3dBackend {
	container: HtmlElement,
	sink: PointerSink,
	theme: Theme,
	relaxation: RelaxationParams,
	height: f64,
	mounted: Option<MountedCanvas<Scene3D>>,
}

impl Canvas3dBackend {
	pub fn new(
		container: HtmlElement,
		sink: PointerSink,
		theme: Theme,
		relaxation: RelaxationParams,
		height: f64,
	) -> Self {
		Self {
			container,
			sink,
			theme,
			relaxation,
			height,
			mounted: None,
		}
	}
}

impl RenderBackend for Canvas3dBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::ThreeD
	}

	fn mount(&mut self, graph: &Graph, style: &SceneStyle) -> Result<(), EngineError> {
		self.teardown();
		self.container.set_inner_html("");

		let (canvas, ctx) = dom::create_canvas(&self.container, self.height)?;

		let mut rng = SmallRng::seed_from_u64(dom::fresh_seed());
		let positions = compute_3d(graph, &self.relaxation, &mut rng);
		let scene = Scene3D::new(
			graph,
			&positions,
			&ScaleConfig::default().node.sizing,
			canvas.width() as f64,
			canvas.height() as f64,
			style.clone(),
		);

		let theme = self.theme.clone();
		let mounted = MountedCanvas::start(&self.container, canvas, scene, &self.sink, move |scene| {
			scene.update();
			if let Err(e) = render3d::render(scene, &ctx, &theme) {
				debug!("epidemic-view: 3D frame failed: {e:?}");
			}
		})?;

		debug!(
			"epidemic-view: 3D view mounted ({} nodes, {} edges, {} relaxation passes)",
			graph.node_count(),
			graph.edge_count(),
			self.relaxation.iterations
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
