//! One-shot fetch of the graph document and its configuration.

use log::{debug, info};
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::layout::{GraphConfig, GraphDocument};

pub const DOCUMENT_URL: &str = "data/graph.json";
pub const CONFIG_URL: &str = "data/config.json";

#[derive(Error, Debug)]
pub enum LoadError {
	#[error("Could not fetch {url}: {reason}")]
	Fetch { url: String, reason: String },
	#[error("Request for {url} failed with HTTP status {status}")]
	Status { url: String, status: u16 },
	#[error("Response from {url} is not text")]
	NotText { url: String },
	#[error("Malformed JSON in {url}: {source}")]
	Malformed {
		url: String,
		#[source]
		source: serde_json::Error,
	},
}

/// Everything the graph canvas is built from.
#[derive(Clone, Debug, Default)]
pub struct GraphInput {
	pub document: GraphDocument,
	pub config: GraphConfig,
}

impl GraphInput {
	pub fn parse(document: &str, config: &str) -> Result<Self, LoadError> {
		let malformed = |url: &str| {
			let url = url.to_string();
			move |source| LoadError::Malformed { url, source }
		};
		Ok(Self {
			document: GraphDocument::from_json(document).map_err(malformed(DOCUMENT_URL))?,
			config: GraphConfig::from_json(config).map_err(malformed(CONFIG_URL))?,
		})
	}
}

fn describe(value: JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

async fn fetch_text(url: &str) -> Result<String, LoadError> {
	let fetch_err = |reason: JsValue| LoadError::Fetch {
		url: url.to_string(),
		reason: describe(reason),
	};
	let window = web_sys::window().ok_or_else(|| LoadError::Fetch {
		url: url.to_string(),
		reason: "no window".into(),
	})?;

	let response: Response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(fetch_err)?
		.dyn_into()
		.map_err(fetch_err)?;
	if !response.ok() {
		return Err(LoadError::Status {
			url: url.to_string(),
			status: response.status(),
		});
	}

	let text = JsFuture::from(response.text().map_err(fetch_err)?)
		.await
		.map_err(fetch_err)?;
	debug!("fetched {url}");
	text.as_string().ok_or_else(|| LoadError::NotText {
		url: url.to_string(),
	})
}

pub async fn load_graph() -> Result<GraphInput, LoadError> {
	let document = fetch_text(DOCUMENT_URL).await?;
	let config = fetch_text(CONFIG_URL).await?;
	let input = GraphInput::parse(&document, &config)?;
	info!(
		"loaded {} objects, {} constraints",
		input.document.data.len(),
		input.config.constraints.len()
	);
	Ok(input)
}
