//! Engine configuration, read from the host page.
//!
//! The page may embed a JSON object in `<script id="simulation-config">`.
//! Every field is optional; anything missing keeps its default.

use log::{info, warn};
use serde::Deserialize;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

use super::backend::BackendKind;
use super::layout::{ForceParams, RelaxationParams};
use super::series::StatsSeries;
use super::types::{InitializeRequest, StartRequest};

/// Id of the script element holding the JSON configuration.
pub const CONFIG_ELEMENT_ID: &str = "simulation-config";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Prefix for service URLs; empty means same origin.
	pub api_base: String,
	pub canvas_height: f64,
	/// Generate a network with the `network` defaults once the view mounts.
	pub load_on_mount: bool,
	pub auto_play_interval_ms: u32,
	/// Start auto-play as soon as a run begins.
	pub auto_play_on_start: bool,
	/// Stop auto-play when a step request fails instead of firing again.
	pub stop_auto_play_on_step_error: bool,
	pub initial_backend: BackendKind,
	/// Defaults for the network generation form.
	pub network: InitializeRequest,
	/// Defaults for the run form.
	pub run: StartRequest,
	pub force: ForceParams,
	pub relaxation: RelaxationParams,
	/// Points kept by the statistics series.
	pub series_capacity: usize,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			api_base: String::new(),
			canvas_height: 700.0,
			load_on_mount: true,
			auto_play_interval_ms: 1000,
			auto_play_on_start: true,
			stop_auto_play_on_step_error: true,
			initial_backend: BackendKind::TwoD,
			network: InitializeRequest::default(),
			run: StartRequest::default(),
			force: ForceParams::default(),
			relaxation: RelaxationParams::default(),
			series_capacity: StatsSeries::DEFAULT_CAPACITY,
		}
	}
}

impl EngineConfig {
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Read the configuration element, falling back to defaults.
	pub fn load_from_dom() -> Self {
		let Some(text) = config_text() else {
			return Self::default();
		};
		match Self::from_json(&text) {
			Ok(config) => {
				info!("epidemic-view: loaded configuration from #{CONFIG_ELEMENT_ID}");
				config
			}
			Err(e) => {
				warn!("epidemic-view: failed to parse configuration: {}", e);
				Self::default()
			}
		}
	}
}

fn config_text() -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(CONFIG_ELEMENT_ID)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_yields_defaults() {
		let config = EngineConfig::from_json("{}").unwrap();
		assert_eq!(config.auto_play_interval_ms, 1000);
		assert!(config.load_on_mount);
		assert!(config.auto_play_on_start);
		assert_eq!(config.initial_backend, BackendKind::TwoD);
		assert_eq!(config.network.n_nodes, 200);
		assert_eq!(config.run.num_initial, 5);
		assert_eq!(config.relaxation.iterations, 12);
		assert_eq!(config.force.link_distance, 50.0);
	}

	#[test]
	fn partial_sections_keep_remaining_defaults() {
		let config = EngineConfig::from_json(
			r#"{
				"api_base": "http://localhost:8000",
				"initial_backend": "three_d",
				"network": {"n_nodes": 50},
				"relaxation": {"iterations": 30},
				"stop_auto_play_on_step_error": false,
				"load_on_mount": false
			}"#,
		)
		.unwrap();
		assert_eq!(config.api_base, "http://localhost:8000");
		assert_eq!(config.initial_backend, BackendKind::ThreeD);
		assert_eq!(config.network.n_nodes, 50);
		assert_eq!(config.network.m_edges, 3);
		assert_eq!(config.relaxation.iterations, 30);
		assert_eq!(config.relaxation.shell_radius, 120.0);
		assert!(!config.stop_auto_play_on_step_error);
		assert!(!config.load_on_mount);
	}

	#[test]
	fn rejects_wrong_types() {
		assert!(EngineConfig::from_json(r#"{"canvas_height": "tall"}"#).is_err());
	}
}
