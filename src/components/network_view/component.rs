//! Leptos shell around the session.
//!
//! The component owns the control panel, the status readouts and the
//! container element backends mount their canvas into. All engine state lives
//! in the [`SessionController`]; the component only mirrors what its listeners
//! report into signals.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::str::FromStr;

use leptos::ev::{Event, MouseEvent};
use leptos::prelude::*;
use web_sys::HtmlElement;

use super::backend::{BackendFactory, BackendKind, PointerPosition, PointerSink, RenderBackend};
use super::canvas2d::Canvas2dBackend;
use super::canvas3d::Canvas3dBackend;
use super::client::HttpSimulationClient;
use super::config::EngineConfig;
use super::error::EngineError;
use super::highlight::FocusInfo;
use super::scheduler::BrowserScheduler;
use super::series::StatsSeries;
use super::session::SessionController;
use super::theme::Theme;
use super::types::{InitializeRequest, Statistics};

type Session = SessionController<HttpSimulationClient>;
type SharedSession = Rc<RefCell<Option<Session>>>;

/// Builds canvas backends inside one container element.
struct CanvasBackends {
	container: HtmlElement,
	theme: Theme,
	config: EngineConfig,
}

impl BackendFactory for CanvasBackends {
	fn create(&self, kind: BackendKind, sink: PointerSink) -> Box<dyn RenderBackend> {
		let (container, theme, height) = (
			self.container.clone(),
			self.theme.clone(),
			self.config.canvas_height,
		);
		match kind {
			BackendKind::TwoD => Box::new(Canvas2dBackend::new(
				container,
				sink,
				theme,
				self.config.force.clone(),
				height,
			)),
			BackendKind::ThreeD => Box::new(Canvas3dBackend::new(
				container,
				sink,
				theme,
				self.config.relaxation.clone(),
				height,
			)),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusKind {
	Loading,
	Success,
	Error,
}

impl StatusKind {
	fn class(self) -> &'static str {
		match self {
			StatusKind::Loading => "status-message loading",
			StatusKind::Success => "status-message success",
			StatusKind::Error => "status-message error",
		}
	}
}

type Status = Option<(String, StatusKind)>;

/// Run `op` on the live session in the background and report its outcome.
fn run_async<F, Fut>(session: &SharedSession, set_status: WriteSignal<Status>, pending: &str, op: F)
where
	F: FnOnce(Session) -> Fut,
	Fut: Future<Output = Result<Option<String>, EngineError>> + 'static,
{
	let Some(controller) = session.borrow().clone() else {
		return;
	};
	set_status.set(Some((pending.to_string(), StatusKind::Loading)));
	let task = op(controller);
	wasm_bindgen_futures::spawn_local(async move {
		set_status.set(match task.await {
			Ok(Some(done)) => Some((done, StatusKind::Success)),
			Ok(None) => None,
			Err(e) => Some((e.to_string(), StatusKind::Error)),
		});
	});
}

/// Ask the service for a new network and mount it.
fn generate(
	session: &SharedSession,
	request: InitializeRequest,
	set_status: WriteSignal<Status>,
	set_loaded: WriteSignal<bool>,
	set_running: WriteSignal<bool>,
) {
	run_async(session, set_status, "Generating network...", move |s| async move {
		let stats = s.load_topology(&request).await?;
		set_loaded.set(true);
		set_running.set(false);
		let summary = stats.summary();
		Ok(Some(if summary.is_empty() {
			"Network generated!".to_string()
		} else {
			format!("Network generated! {summary}")
		}))
	});
}

fn parsed<T: FromStr>(ev: &Event, fallback: T) -> T {
	event_target_value(ev).trim().parse().unwrap_or(fallback)
}

/// Interactive epidemic network view: controls, canvas and node details.
///
/// Without an explicit `config` the component reads one from the page (see
/// [`EngineConfig::load_from_dom`]). `on_series` receives the statistics
/// series after every update, for an external chart.
#[component]
pub fn NetworkView(
	#[prop(optional)] config: Option<EngineConfig>,
	#[prop(optional, into)] on_series: Option<Callback<StatsSeries>>,
) -> impl IntoView {
	let config = config.unwrap_or_else(EngineConfig::load_from_dom);
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let session: SharedSession = Rc::new(RefCell::new(None));

	let (network, set_network) = signal(config.network.clone());
	let (run, set_run) = signal(config.run.clone());
	let (kind, set_kind) = signal(config.initial_backend);
	let (statistics, set_statistics) = signal(Statistics::default());
	let (focus, set_focus) = signal(None::<FocusInfo>);
	let (auto_playing, set_auto_playing) = signal(false);
	let (loaded, set_loaded) = signal(false);
	let (running, set_running) = signal(false);
	let (status, set_status) = signal(None::<(String, StatusKind)>);
	let (tooltip, set_tooltip) = signal(None::<String>);

	let (session_init, config_init) = (session.clone(), config.clone());
	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		if session_init.borrow().is_some() {
			return;
		}
		let theme = Theme::default();
		let factory = CanvasBackends {
			container: container.into(),
			theme: theme.clone(),
			config: config_init.clone(),
		};
		let controller = SessionController::new(
			HttpSimulationClient::new(config_init.api_base.clone()),
			Rc::new(BrowserScheduler),
			Box::new(factory),
			config_init.clone(),
			&theme,
		);
		controller.on_focus(move |info| set_focus.set(info.cloned()));
		controller.on_statistics(move |stats, series| {
			set_statistics.set(stats.clone());
			if let Some(on_series) = on_series {
				on_series.run(series.clone());
			}
		});
		controller.on_auto_play(move |playing| set_auto_playing.set(playing));
		controller.on_error(move |e| set_status.set(Some((e.to_string(), StatusKind::Error))));
		*session_init.borrow_mut() = Some(controller);
		if config_init.load_on_mount {
			generate(&session_init, network.get_untracked(), set_status, set_loaded, set_running);
		}
	});

	let session_ini = session.clone();
	let on_initialize = move |_| {
		generate(&session_ini, network.get_untracked(), set_status, set_loaded, set_running);
	};

	let session_hover = session.clone();
	let on_hover = move |ev: MouseEvent| {
		let text = session_hover.borrow().as_ref().and_then(|controller| {
			controller.tooltip_at(PointerPosition {
				x: ev.offset_x() as f64,
				y: ev.offset_y() as f64,
			})
		});
		if tooltip.get_untracked() != text {
			set_tooltip.set(text);
		}
	};

	let session_start = session.clone();
	let on_start = move |_| {
		let request = run.get_untracked();
		run_async(&session_start, set_status, "Starting simulation...", move |s| async move {
			s.begin_run(&request).await?;
			set_running.set(s.run_started());
			Ok(Some("Simulation started!".to_string()))
		});
	};

	let session_step = session.clone();
	let on_step = move |_| {
		run_async(&session_step, set_status, "Stepping...", move |s| async move {
			let over = s.advance_step().await?;
			Ok(over.then(|| "Outbreak is over.".to_string()))
		});
	};

	let session_reset = session.clone();
	let on_reset = move |_| {
		run_async(&session_reset, set_status, "Resetting...", move |s| async move {
			s.reset_view().await?;
			set_running.set(false);
			Ok(Some("Simulation reset.".to_string()))
		});
	};

	let session_auto = session.clone();
	let on_auto_play = move |_| {
		let Some(controller) = session_auto.borrow().clone() else {
			return;
		};
		if let Err(e) = controller.toggle_auto_play() {
			set_status.set(Some((e.to_string(), StatusKind::Error)));
		}
	};

	let session_view = session.clone();
	let on_view = move |ev: Event| {
		let next = match event_target_value(&ev).as_str() {
			"3d" => BackendKind::ThreeD,
			_ => BackendKind::TwoD,
		};
		set_kind.set(next);
		let Some(controller) = session_view.borrow().clone() else {
			return;
		};
		if let Err(e) = controller.switch_backend(next) {
			set_status.set(Some((e.to_string(), StatusKind::Error)));
		}
	};

	let container_style = format!("position: relative; width: 100%; height: {}px;", config.canvas_height);

	view! {
		<div class="epidemic-view">
			<div class="controls">
				<fieldset>
					<legend>"Network"</legend>
					<label>
						"Nodes"
						<input
							type="number"
							min="10"
							prop:value=move || network.get().n_nodes.to_string()
							on:change=move |ev| set_network.update(|n| n.n_nodes = parsed(&ev, n.n_nodes))
						/>
					</label>
					<label>
						"Edges per new node"
						<input
							type="number"
							min="1"
							prop:value=move || network.get().m_edges.to_string()
							on:change=move |ev| set_network.update(|n| n.m_edges = parsed(&ev, n.m_edges))
						/>
					</label>
					<label>
						"View"
						<select on:change=on_view>
							<option value="2d" selected=move || kind.get() == BackendKind::TwoD>"2D"</option>
							<option value="3d" selected=move || kind.get() == BackendKind::ThreeD>"3D"</option>
						</select>
					</label>
					<button on:click=on_initialize>"Generate network"</button>
				</fieldset>

				<fieldset>
					<legend>"Simulation"</legend>
					<label>
						"Infection probability "
						<span class="prob-value">{move || format!("{:.2}", run.get().infection_probability)}</span>
						<input
							type="range"
							min="0"
							max="1"
							step="0.01"
							prop:value=move || run.get().infection_probability.to_string()
							on:input=move |ev| {
								set_run.update(|r| r.infection_probability = parsed(&ev, r.infection_probability))
							}
						/>
					</label>
					<label>
						"Initially infected"
						<input
							type="number"
							min="1"
							prop:value=move || run.get().num_initial.to_string()
							on:change=move |ev| set_run.update(|r| r.num_initial = parsed(&ev, r.num_initial))
						/>
					</label>
					<button on:click=on_start disabled=move || !loaded.get()>"Start"</button>
					<button on:click=on_step disabled=move || !running.get() || auto_playing.get()>"Step"</button>
					<button on:click=on_auto_play disabled=move || !running.get()>
						{move || if auto_playing.get() { "Pause" } else { "Auto-play" }}
					</button>
					<button on:click=on_reset disabled=move || !loaded.get()>"Reset"</button>
				</fieldset>
			</div>

			{move || status.get().map(|(text, level)| view! { <div class=level.class()>{text}</div> })}

			<div class="stats">
				<span>"Step: " {move || statistics.get().time_step}</span>
				<span>"Infected: " {move || statistics.get().infected_count}</span>
				<span>"Healthy: " {move || statistics.get().healthy_count}</span>
				<span>"Rate: " {move || statistics.get().rate_percent()}</span>
			</div>

			<div
				node_ref=container_ref
				class="network-container"
				style=container_style
				title=move || tooltip.get()
				on:mousemove=on_hover
				on:mouseleave=move |_| set_tooltip.set(None)
			/>

			<div class="node-info">
				{move || match focus.get() {
					Some(info) => view! {
						<h3>"Node " {info.id.to_string()}</h3>
						<p>"Status: " {info.status_label()}</p>
						<p>"Degree: " {info.degree}</p>
						<p>"Neighbors: " {info.neighbor_list()}</p>
					}
					.into_any(),
					None => view! { <p class="hint">"Hover a node to inspect it."</p> }.into_any(),
				}}
			</div>
		</div>
	}
}
