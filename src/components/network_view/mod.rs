//! Epidemic network view.
//!
//! Shows a contact network generated by the simulation service and recolors
//! it as infection spreads:
//! - 2D force layout on a canvas with drag, pan and zoom
//! - 3D spring-relaxed layout seen through a damped orbit camera
//! - Hover focus that emphasizes a node, its neighbors and incident edges
//! - Stepping and auto-play against the service, with a statistics series
//!
//! # Example
//!
//! ```ignore
//! use epidemic_view::{EngineConfig, NetworkView};
//!
//! let config = EngineConfig {
//!     api_base: "http://localhost:8000".into(),
//!     ..EngineConfig::default()
//! };
//!
//! view! { <NetworkView config=config /> }
//! ```

pub mod backend;
pub mod camera;
mod canvas2d;
mod canvas3d;
pub mod client;
mod component;
pub mod config;
mod dom;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod highlight;
pub mod layout;
mod render;
mod render3d;
pub mod scale;
mod scene2d;
mod scene3d;
pub mod scheduler;
pub mod series;
pub mod session;
pub mod theme;
pub mod types;

pub use backend::{BackendFactory, BackendKind, PointerAction, RenderBackend};
pub use client::{HttpSimulationClient, SimulationClient};
pub use component::NetworkView;
pub use config::EngineConfig;
pub use error::EngineError;
pub use graph::Graph;
pub use highlight::{FocusInfo, FocusState, HighlightController};
pub use scheduler::{BrowserScheduler, Scheduler};
pub use series::StatsSeries;
pub use session::SessionController;
pub use theme::Theme;
pub use types::{InitializeRequest, NodeId, StartRequest, Statistics};
