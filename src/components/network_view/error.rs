//! Error type shared by the session, client and render backends.

use thiserror::Error;

/// Failures surfaced to the UI shell by engine operations.
///
/// Service and transport failures leave the live graph, highlight and backend
/// exactly as they were. A `RenderSetup` failure during a load keeps the new
/// graph but leaves nothing mounted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
	/// The simulation service could not be reached.
	#[error("Network error: {0}")]
	Transport(String),
	/// The service answered with a non-success status.
	#[error("Error: {0}")]
	ServiceRejected(String),
	/// The service answered with a body that does not match the expected shape.
	#[error("Unexpected response: {0}")]
	MalformedResponse(String),
	/// The backend could not acquire a drawing surface.
	#[error("Error rendering graph: {0}")]
	RenderSetup(String),
	/// An operation needs a loaded topology but none is live.
	#[error("Network not initialized")]
	NoTopology,
	/// A timer or task could not be scheduled.
	#[error("Scheduler error: {0}")]
	Scheduler(String),
}

impl EngineError {
	/// Build an error from a thrown JS value, keeping its string form if it has one.
	pub(crate) fn from_js(kind: fn(String) -> Self, value: &wasm_bindgen::JsValue) -> Self {
		kind(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_match_user_facing_prefixes() {
		assert_eq!(
			EngineError::Transport("connection refused".into()).to_string(),
			"Network error: connection refused"
		);
		assert_eq!(
			EngineError::ServiceRejected("Simulation not started".into()).to_string(),
			"Error: Simulation not started"
		);
	}
}
