//! epidemic-view: Interactive epidemic-spread network visualization.
//!
//! This crate provides a WASM front end for an epidemic simulation service.
//! It renders the contact network as a 2D force layout or a 3D orbit view,
//! recolors nodes as infection spreads, and drives the run step by step or on
//! an auto-play timer.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod components;

pub use components::network_view::{
	EngineConfig, EngineError, NetworkView, SessionController, SimulationClient, StatsSeries,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("epidemic-view: logging initialized");
}

/// Main application component.
/// Reads configuration from the DOM and renders the network view.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Epidemic Spread Simulation" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<main class="simulation">
			<h1>"Epidemic Spread on Networks"</h1>
			<p class="subtitle">
				"Generate a network, seed infections and step the outbreak. Hover a node to inspect it; click to infect it."
			</p>
			<NetworkView />
		</main>
	}
}
