//! Request/response boundary to the simulation service.

use std::future::Future;

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::error::EngineError;
use super::types::{
	InfectRequest, InitializeRequest, NodeId, RunUpdate, StartRequest, StepUpdate, TopologyResponse,
};

/// Calls the session makes against the simulation service.
///
/// Every call is a single round-trip; no retries happen at this layer.
pub trait SimulationClient {
	fn initialize(
		&self,
		request: &InitializeRequest,
	) -> impl Future<Output = Result<TopologyResponse, EngineError>>;

	fn start(&self, request: &StartRequest) -> impl Future<Output = Result<RunUpdate, EngineError>>;

	fn step(&self) -> impl Future<Output = Result<StepUpdate, EngineError>>;

	fn infect(&self, node: NodeId) -> impl Future<Output = Result<RunUpdate, EngineError>>;

	fn reset(&self) -> impl Future<Output = Result<(), EngineError>>;
}

#[derive(Deserialize)]
struct Envelope {
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	message: Option<String>,
}

/// Decode a response body, turning a non-success `status` into `ServiceRejected`.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> Result<T, EngineError> {
	let value: serde_json::Value =
		serde_json::from_str(body).map_err(|e| EngineError::MalformedResponse(e.to_string()))?;
	let envelope = Envelope::deserialize(&value)
		.map_err(|e| EngineError::MalformedResponse(e.to_string()))?;
	match envelope.status.as_deref() {
		None | Some("success") => {}
		Some(_) => {
			return Err(EngineError::ServiceRejected(
				envelope.message.unwrap_or_else(|| "request failed".to_string()),
			));
		}
	}
	T::deserialize(value).map_err(|e| EngineError::MalformedResponse(e.to_string()))
}

/// [`SimulationClient`] over `fetch`, POSTing JSON to `{base_url}/api/{call}/`.
#[derive(Clone, Debug, Default)]
pub struct HttpSimulationClient {
	base_url: String,
}

impl HttpSimulationClient {
	/// `base_url` may be empty for same-origin requests.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
		}
	}

	pub(crate) fn url(&self, call: &str) -> String {
		format!("{}/api/{call}/", self.base_url.trim_end_matches('/'))
	}

	async fn post<T: DeserializeOwned>(&self, call: &str, body: Option<String>) -> Result<T, EngineError> {
		let transport = |e: JsValue| EngineError::from_js(EngineError::Transport, &e);
		let url = self.url(call);

		let init = RequestInit::new();
		init.set_method("POST");
		if let Some(body) = &body {
			init.set_body(&JsValue::from_str(body));
		}
		let request = Request::new_with_str_and_init(&url, &init).map_err(transport)?;
		request
			.headers()
			.set("Content-Type", "application/json")
			.map_err(transport)?;

		let window = web_sys::window().ok_or_else(|| EngineError::Transport("no window".into()))?;
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(transport)?
			.dyn_into()
			.map_err(|_| EngineError::MalformedResponse("fetch did not yield a Response".into()))?;

		let malformed = |e: JsValue| EngineError::from_js(EngineError::MalformedResponse, &e);
		let text = JsFuture::from(response.text().map_err(malformed)?)
			.await
			.map_err(malformed)?
			.as_string()
			.ok_or_else(|| EngineError::MalformedResponse("body is not text".into()))?;

		debug!("epidemic-view: POST {url} -> {}", response.status());
		decode(&text)
	}

	fn encode<B: serde::Serialize>(body: &B) -> Result<Option<String>, EngineError> {
		serde_json::to_string(body)
			.map(Some)
			.map_err(|e| EngineError::MalformedResponse(e.to_string()))
	}
}

impl SimulationClient for HttpSimulationClient {
	async fn initialize(&self, request: &InitializeRequest) -> Result<TopologyResponse, EngineError> {
		self.post("initialize", Self::encode(request)?).await
	}

	async fn start(&self, request: &StartRequest) -> Result<RunUpdate, EngineError> {
		self.post("start", Self::encode(request)?).await
	}

	async fn step(&self) -> Result<StepUpdate, EngineError> {
		self.post("step", None).await
	}

	async fn infect(&self, node: NodeId) -> Result<RunUpdate, EngineError> {
		self.post("infect", Self::encode(&InfectRequest { node_id: node })?)
			.await
	}

	async fn reset(&self) -> Result<(), EngineError> {
		self.post::<serde_json::Value>("reset", None).await.map(|_| ())
	}
}
