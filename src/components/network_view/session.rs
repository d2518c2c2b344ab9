//! The session: one live graph, one mounted backend, one highlight state.
//!
//! [`SessionController`] is the only thing the UI shell talks to. It reaches
//! the service through a [`SimulationClient`] and the screen through whatever
//! [`RenderBackend`] its factory builds.
//!
//! Every async operation has the same shape: check preconditions, await the
//! service without holding a borrow, then apply the response in one
//! synchronous step. A snapshot that was requested before the graph was
//! replaced or reset is dropped on arrival.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};

use super::backend::{
	BackendFactory, BackendKind, PointerAction, PointerPosition, PointerSink, RenderBackend,
};
use super::client::SimulationClient;
use super::config::EngineConfig;
use super::error::EngineError;
use super::graph::Graph;
use super::highlight::{FocusInfo, FocusState, HighlightController};
use super::scheduler::{IntervalHandle, Scheduler};
use super::series::StatsSeries;
use super::theme::Theme;
use super::types::{InfectionSnapshot, InitializeRequest, NetworkStats, NodeId, StartRequest, Statistics};

type FocusListener = Box<dyn Fn(Option<&FocusInfo>)>;
type StatisticsListener = Box<dyn Fn(&Statistics, &StatsSeries)>;
type AutoPlayListener = Box<dyn Fn(bool)>;
type ErrorListener = Box<dyn Fn(&EngineError)>;

#[derive(Default)]
struct Listeners {
	focus: Vec<FocusListener>,
	statistics: Vec<StatisticsListener>,
	auto_play: Vec<AutoPlayListener>,
	error: Vec<ErrorListener>,
}

struct Session {
	graph: Option<Graph>,
	network_stats: NetworkStats,
	backend: Option<Box<dyn RenderBackend>>,
	kind: BackendKind,
	highlight: HighlightController,
	auto_play: Option<Box<dyn IntervalHandle>>,
	statistics: Statistics,
	series: StatsSeries,
	/// Bumped whenever the graph is replaced or reset.
	epoch: u64,
	run_started: bool,
	step_in_flight: bool,
}

impl Session {
	fn teardown_backend(&mut self) {
		if let Some(mut backend) = self.backend.take() {
			backend.teardown();
		}
	}
}

struct Inner<C> {
	session: RefCell<Session>,
	listeners: RefCell<Listeners>,
	client: C,
	scheduler: Rc<dyn Scheduler>,
	factory: Box<dyn BackendFactory>,
	config: EngineConfig,
}

/// Owns the live session and coordinates client, backend and highlight.
///
/// Cloning is cheap and every clone drives the same session.
pub struct SessionController<C: SimulationClient + 'static> {
	inner: Rc<Inner<C>>,
}

impl<C: SimulationClient + 'static> Clone for SessionController<C> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<C: SimulationClient + 'static> SessionController<C> {
	pub fn new(
		client: C,
		scheduler: Rc<dyn Scheduler>,
		factory: Box<dyn BackendFactory>,
		config: EngineConfig,
		theme: &Theme,
	) -> Self {
		let session = Session {
			graph: None,
			network_stats: NetworkStats::default(),
			backend: None,
			kind: config.initial_backend,
			highlight: HighlightController::new(theme),
			auto_play: None,
			statistics: Statistics::default(),
			series: StatsSeries::new(config.series_capacity),
			epoch: 0,
			run_started: false,
			step_in_flight: false,
		};
		Self {
			inner: Rc::new(Inner {
				session: RefCell::new(session),
				listeners: RefCell::new(Listeners::default()),
				client,
				scheduler,
				factory,
				config,
			}),
		}
	}

	pub fn config(&self) -> &EngineConfig {
		&self.inner.config
	}

	// -- listeners --

	/// Called with the focused node's details, or `None` when focus clears.
	pub fn on_focus(&self, listener: impl Fn(Option<&FocusInfo>) + 'static) {
		self.inner.listeners.borrow_mut().focus.push(Box::new(listener));
	}

	pub fn on_statistics(&self, listener: impl Fn(&Statistics, &StatsSeries) + 'static) {
		self.inner.listeners.borrow_mut().statistics.push(Box::new(listener));
	}

	pub fn on_auto_play(&self, listener: impl Fn(bool) + 'static) {
		self.inner.listeners.borrow_mut().auto_play.push(Box::new(listener));
	}

	/// Failures of work the session started on its own (auto-play, clicks).
	pub fn on_error(&self, listener: impl Fn(&EngineError) + 'static) {
		self.inner.listeners.borrow_mut().error.push(Box::new(listener));
	}

	fn emit_focus(&self, info: Option<&FocusInfo>) {
		for listener in &self.inner.listeners.borrow().focus {
			listener(info);
		}
	}

	fn emit_statistics(&self) {
		let (statistics, series) = {
			let session = self.inner.session.borrow();
			(session.statistics.clone(), session.series.clone())
		};
		for listener in &self.inner.listeners.borrow().statistics {
			listener(&statistics, &series);
		}
	}

	fn emit_auto_play(&self, running: bool) {
		for listener in &self.inner.listeners.borrow().auto_play {
			listener(running);
		}
	}

	fn emit_error(&self, error: &EngineError) {
		for listener in &self.inner.listeners.borrow().error {
			listener(error);
		}
	}

	// -- queries --

	pub fn kind(&self) -> BackendKind {
		self.inner.session.borrow().kind
	}

	pub fn is_mounted(&self) -> bool {
		self.inner
			.session
			.borrow()
			.backend
			.as_ref()
			.is_some_and(|b| b.is_mounted())
	}

	pub fn is_auto_playing(&self) -> bool {
		self.inner.session.borrow().auto_play.is_some()
	}

	pub fn run_started(&self) -> bool {
		self.inner.session.borrow().run_started
	}

	pub fn focus_state(&self) -> FocusState {
		self.inner.session.borrow().highlight.state()
	}

	pub fn statistics(&self) -> Statistics {
		self.inner.session.borrow().statistics.clone()
	}

	pub fn series(&self) -> StatsSeries {
		self.inner.session.borrow().series.clone()
	}

	pub fn network_stats(&self) -> NetworkStats {
		self.inner.session.borrow().network_stats.clone()
	}

	/// Run `f` against the live graph, if there is one.
	pub fn with_graph<R>(&self, f: impl FnOnce(&Graph) -> R) -> Option<R> {
		self.inner.session.borrow().graph.as_ref().map(f)
	}

	fn epoch(&self) -> u64 {
		self.inner.session.borrow().epoch
	}

	/// Current epoch, or `NoTopology` when nothing is loaded.
	fn require_topology(&self) -> Result<u64, EngineError> {
		let session = self.inner.session.borrow();
		match session.graph {
			Some(_) => Ok(session.epoch),
			None => Err(EngineError::NoTopology),
		}
	}

	// -- backend --

	fn sink(&self) -> PointerSink {
		let weak: Weak<Inner<C>> = Rc::downgrade(&self.inner);
		Rc::new(move |action| {
			if let Some(inner) = weak.upgrade() {
				SessionController { inner }.handle_pointer(action);
			}
		})
	}

	/// Build a backend of `kind` and mount the live graph on it.
	fn mount_backend(&self, kind: BackendKind) -> Result<(), EngineError> {
		if self.inner.session.borrow().graph.is_none() {
			return Ok(());
		}
		let mut backend = self.inner.factory.create(kind, self.sink());

		let mut guard = self.inner.session.borrow_mut();
		let session = &mut *guard;
		let Some(graph) = session.graph.as_ref() else {
			return Ok(());
		};
		if let Err(e) = backend.mount(graph, session.highlight.style()) {
			warn!("epidemic-view: failed to mount {kind} view: {e}");
			return Err(e);
		}
		info!(
			"epidemic-view: mounted {kind} view ({} nodes, {} edges)",
			graph.node_count(),
			graph.edge_count()
		);
		session.backend = Some(backend);
		Ok(())
	}

	/// Replace the active view. Focus resets to idle and the new view lays
	/// the graph out from scratch.
	pub fn switch_backend(&self, kind: BackendKind) -> Result<(), EngineError> {
		{
			let mut guard = self.inner.session.borrow_mut();
			let session = &mut *guard;
			if session.kind == kind && session.backend.as_ref().is_some_and(|b| b.is_mounted()) {
				return Ok(());
			}
			session.teardown_backend();
			session.kind = kind;
			let empty = Graph::default();
			session.highlight.clear(session.graph.as_ref().unwrap_or(&empty));
		}
		info!("epidemic-view: switching to {kind} view");
		self.emit_focus(None);
		self.mount_backend(kind)
	}

	// -- service operations --

	/// Generate a network and make it the live graph.
	pub async fn load_topology(&self, request: &InitializeRequest) -> Result<NetworkStats, EngineError> {
		let topology = self.inner.client.initialize(request).await?;
		let graph = Graph::load(&topology);
		let (nodes, edges) = (graph.node_count(), graph.edge_count());

		self.stop_auto_play();
		{
			let mut guard = self.inner.session.borrow_mut();
			let session = &mut *guard;
			session.teardown_backend();
			session.epoch += 1;
			session.highlight.clear(&graph);
			session.series.reset(nodes);
			session.statistics = Statistics::baseline(nodes);
			session.network_stats = topology.stats.clone();
			session.run_started = false;
			session.graph = Some(graph);
		}
		info!("epidemic-view: network loaded ({nodes} nodes, {edges} edges)");

		let mounted = self.mount_backend(self.kind());
		self.emit_focus(None);
		self.emit_statistics();
		mounted.map(|()| topology.stats)
	}

	/// Seed the initial infections and, if configured, start auto-play.
	pub async fn begin_run(&self, request: &StartRequest) -> Result<(), EngineError> {
		let epoch = self.require_topology()?;
		let update = self.inner.client.start(request).await?;
		if !self.apply_update(epoch, &update.infection_state, &update.statistics) {
			return Ok(());
		}
		self.inner.session.borrow_mut().run_started = true;
		info!(
			"epidemic-view: run started with {} infected",
			update.statistics.infected_count
		);
		if self.inner.config.auto_play_on_start {
			self.start_auto_play()?;
		}
		Ok(())
	}

	/// Advance the run by one step. Returns whether the outbreak is over.
	pub async fn advance_step(&self) -> Result<bool, EngineError> {
		let epoch = self.require_topology()?;
		self.inner.session.borrow_mut().step_in_flight = true;
		let result = self.inner.client.step().await;
		self.inner.session.borrow_mut().step_in_flight = false;

		let update = match result {
			Ok(update) => update,
			Err(e) => {
				if self.is_auto_playing() && self.inner.config.stop_auto_play_on_step_error {
					warn!("epidemic-view: step failed, stopping auto-play: {e}");
					self.stop_auto_play();
				}
				return Err(e);
			}
		};
		if !self.apply_update(epoch, &update.infection_state, &update.statistics) {
			return Ok(false);
		}

		let over = update.step_result.is_outbreak_over;
		debug!(
			"epidemic-view: step {} ({} infected)",
			update.statistics.time_step, update.statistics.infected_count
		);
		if over && self.is_auto_playing() {
			info!("epidemic-view: outbreak over at step {}", update.statistics.time_step);
			self.stop_auto_play();
		}
		Ok(over)
	}

	/// Ask the service to infect `node`.
	pub async fn manual_infect(&self, node: NodeId) -> Result<(), EngineError> {
		let epoch = self.require_topology()?;
		let update = self.inner.client.infect(node).await?;
		if self.apply_update(epoch, &update.infection_state, &update.statistics) {
			info!("epidemic-view: infected node {node}");
		}
		Ok(())
	}

	/// Stop auto-play, reset the service and mark every node healthy.
	pub async fn reset_view(&self) -> Result<(), EngineError> {
		self.stop_auto_play();
		self.inner.client.reset().await?;

		let focus = {
			let mut guard = self.inner.session.borrow_mut();
			let session = &mut *guard;
			session.epoch += 1;
			session.run_started = false;
			let total = session.graph.as_ref().map_or(0, Graph::node_count);
			session.statistics = Statistics::baseline(total);
			session.series.reset(total);
			match session.graph.as_mut() {
				Some(graph) => {
					graph.reset_infections();
					let focus = session.highlight.refresh(graph);
					if let Some(backend) = session.backend.as_mut() {
						backend.recolor(session.highlight.style());
					}
					focus
				}
				None => None,
			}
		};
		info!("epidemic-view: simulation reset");
		if focus.is_some() {
			self.emit_focus(focus.as_ref());
		}
		self.emit_statistics();
		Ok(())
	}

	/// Apply a snapshot taken at `epoch`. Returns `false` if it was stale.
	fn apply_update(&self, epoch: u64, snapshot: &InfectionSnapshot, statistics: &Statistics) -> bool {
		let focus = {
			let mut guard = self.inner.session.borrow_mut();
			let session = &mut *guard;
			if session.epoch != epoch {
				debug!("epidemic-view: dropping snapshot from an earlier network");
				return false;
			}
			let Some(graph) = session.graph.as_mut() else {
				return false;
			};
			let report = graph.apply_infection_snapshot(snapshot);
			if report.ignored > 0 {
				warn!(
					"epidemic-view: snapshot named {} unknown node(s); ignored",
					report.ignored
				);
			}
			let focus = session.highlight.refresh(graph);
			if let Some(backend) = session.backend.as_mut() {
				backend.recolor(session.highlight.style());
			}
			session.statistics = statistics.clone();
			session.series.push(statistics);
			focus
		};
		if focus.is_some() {
			self.emit_focus(focus.as_ref());
		}
		self.emit_statistics();
		true
	}

	// -- auto-play --

	/// Step the run on a fixed cadence. Starting twice keeps one timer.
	pub fn start_auto_play(&self) -> Result<(), EngineError> {
		{
			let session = self.inner.session.borrow();
			if session.auto_play.is_some() {
				debug!("epidemic-view: auto-play already running");
				return Ok(());
			}
			if session.graph.is_none() {
				return Err(EngineError::NoTopology);
			}
		}

		let weak = Rc::downgrade(&self.inner);
		let period = self.inner.config.auto_play_interval_ms;
		let handle = self.inner.scheduler.every(
			period,
			Box::new(move || {
				let Some(inner) = weak.upgrade() else {
					return;
				};
				if inner.session.borrow().step_in_flight {
					debug!("epidemic-view: previous step still pending, skipping tick");
					return;
				}
				let controller = SessionController { inner };
				let task = controller.clone();
				controller.inner.scheduler.spawn(Box::pin(async move {
					if let Err(e) = task.advance_step().await {
						task.emit_error(&e);
					}
				}));
			}),
		)?;

		self.inner.session.borrow_mut().auto_play = Some(handle);
		info!("epidemic-view: auto-play started every {period} ms");
		self.emit_auto_play(true);
		Ok(())
	}

	pub fn stop_auto_play(&self) {
		let handle = self.inner.session.borrow_mut().auto_play.take();
		if let Some(handle) = handle {
			handle.cancel();
			info!("epidemic-view: auto-play stopped");
			self.emit_auto_play(false);
		}
	}

	/// Flip auto-play. Returns whether it is now running.
	pub fn toggle_auto_play(&self) -> Result<bool, EngineError> {
		if self.is_auto_playing() {
			self.stop_auto_play();
			Ok(false)
		} else {
			self.start_auto_play()?;
			Ok(true)
		}
	}

	// -- pointer --

	/// Node under `pointer` on the mounted view.
	pub fn node_at(&self, pointer: PointerPosition) -> Option<NodeId> {
		let session = self.inner.session.borrow();
		session.backend.as_ref().filter(|b| b.is_mounted())?.pick(pointer)
	}

	/// Hover text for the node under `pointer`. Only the 2D view has one.
	pub fn tooltip_at(&self, pointer: PointerPosition) -> Option<String> {
		if self.kind() != BackendKind::TwoD {
			return None;
		}
		let id = self.node_at(pointer)?;
		self.with_graph(|graph| {
			graph.node(id).map(|node| {
				let status = if node.infected { "Infected" } else { "Healthy" };
				format!("ID: {}\nDegree: {}\nStatus: {status}", node.id, node.degree)
			})
		})
		.flatten()
	}

	/// React to a hover or click reported by the active backend.
	pub fn handle_pointer(&self, action: PointerAction) {
		match action {
			PointerAction::Hover(target) => {
				let info = {
					let mut guard = self.inner.session.borrow_mut();
					let session = &mut *guard;
					let Some(graph) = session.graph.as_ref() else {
						return;
					};
					let info = match target {
						Some(id) => session.highlight.focus(graph, id),
						None => {
							session.highlight.clear(graph);
							None
						}
					};
					if let Some(backend) = session.backend.as_mut() {
						backend.recolor(session.highlight.style());
					}
					info
				};
				self.emit_focus(info.as_ref());
			}
			PointerAction::Click(id) => {
				if !self.click_infects(id) {
					debug!("epidemic-view: click on node {id} ignored");
					return;
				}
				let task = self.clone();
				self.inner.scheduler.spawn(Box::pin(async move {
					if let Err(e) = task.manual_infect(id).await {
						warn!("epidemic-view: infecting node {id} failed: {e}");
						task.emit_error(&e);
					}
				}));
			}
		}
	}

	/// Clicks infect only while auto-play is off. The 3D view also skips
	/// nodes that are already infected.
	fn click_infects(&self, id: NodeId) -> bool {
		let session = self.inner.session.borrow();
		if session.auto_play.is_some() {
			return false;
		}
		match session.graph.as_ref().and_then(|g| g.node(id)) {
			None => false,
			Some(node) => !(session.kind == BackendKind::ThreeD && node.infected),
		}
	}
}
