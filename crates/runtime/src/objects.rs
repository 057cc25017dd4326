//! Channel handles for the remote browser objects.
//!
//! Each handle is a guid plus a shared [`Connection`]; every method is a
//! single driver round trip. Element operations are sent to the page's main
//! frame with `strict: false`, so a selector matching several elements acts
//! on the first one.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use unipfp_protocol::{FilePayload, StorageState};

use crate::DEFAULT_TIMEOUT_MS;
use crate::connection::{Connection, Event};
use crate::error::{Error, Result};

/// Element state awaited by [`Page::wait_for_selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
	Attached,
	Visible,
	Hidden,
}

impl WaitState {
	fn as_protocol(self) -> &'static str {
		match self {
			WaitState::Attached => "attached",
			WaitState::Visible => "visible",
			WaitState::Hidden => "hidden",
		}
	}
}

fn guid_field(result: &Value, field: &str) -> Result<String> {
	result[field]["guid"]
		.as_str()
		.map(String::from)
		.ok_or_else(|| Error::ProtocolError(format!("response is missing '{field}.guid'")))
}

fn millis(duration: Duration) -> f64 {
	duration.as_millis() as f64
}

/// A launched browser process.
#[derive(Clone)]
pub struct Browser {
	connection: Arc<Connection>,
	guid: String,
}

impl Browser {
	pub(crate) fn new(connection: Arc<Connection>, guid: String) -> Self {
		Self { connection, guid }
	}

	pub fn guid(&self) -> &str {
		&self.guid
	}

	/// Creates an isolated context, optionally seeded with a storage snapshot.
	pub async fn new_context(&self, storage_state: Option<&StorageState>) -> Result<BrowserContext> {
		let mut params = json!({});
		if let Some(state) = storage_state {
			params["storageState"] = serde_json::to_value(state)?;
		}

		let result = self.connection.send_message(&self.guid, "newContext", params).await?;
		let guid = guid_field(&result, "context")?;
		Ok(BrowserContext {
			connection: Arc::clone(&self.connection),
			guid,
		})
	}

	pub async fn close(&self) -> Result<()> {
		self.connection.send_message(&self.guid, "close", json!({})).await.map(|_| ())
	}
}

impl std::fmt::Debug for Browser {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Browser").field("guid", &self.guid).finish()
	}
}

/// An isolated cookie/storage jar inside a browser.
#[derive(Clone)]
pub struct BrowserContext {
	connection: Arc<Connection>,
	guid: String,
}

impl BrowserContext {
	pub fn guid(&self) -> &str {
		&self.guid
	}

	pub async fn new_page(&self) -> Result<Page> {
		let result = self.connection.send_message(&self.guid, "newPage", json!({})).await?;
		let guid = guid_field(&result, "page")?;

		let page = self
			.connection
			.object(&guid)
			.ok_or_else(|| Error::ProtocolError(format!("page {guid} was never announced")))?;
		let main_frame = page.initializer["mainFrame"]["guid"]
			.as_str()
			.map(String::from)
			.ok_or_else(|| Error::ProtocolError(format!("page {guid} has no main frame")))?;

		Ok(Page {
			connection: Arc::clone(&self.connection),
			guid,
			context: self.guid.clone(),
			main_frame,
		})
	}

	/// Snapshots cookies and local storage of every origin in the context.
	pub async fn storage_state(&self) -> Result<StorageState> {
		let result = self.connection.send_message(&self.guid, "storageState", json!({})).await?;
		Ok(serde_json::from_value(result)?)
	}

	pub async fn close(&self) -> Result<()> {
		self.connection.send_message(&self.guid, "close", json!({})).await.map(|_| ())
	}
}

impl std::fmt::Debug for BrowserContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserContext").field("guid", &self.guid).finish()
	}
}

/// A tab inside a context.
#[derive(Clone)]
pub struct Page {
	connection: Arc<Connection>,
	guid: String,
	context: String,
	main_frame: String,
}

impl Page {
	pub fn guid(&self) -> &str {
		&self.guid
	}

	async fn frame_call(&self, method: &str, params: Value) -> Result<Value> {
		self.connection.send_message(&self.main_frame, method, params).await
	}

	pub async fn goto(&self, url: &str) -> Result<()> {
		self.frame_call(
			"goto",
			json!({ "url": url, "timeout": DEFAULT_TIMEOUT_MS, "waitUntil": "load" }),
		)
		.await
		.map(|_| ())
	}

	pub async fn wait_for_selector(&self, selector: &str, state: WaitState, timeout: Duration) -> Result<()> {
		self.frame_call(
			"waitForSelector",
			json!({
				"selector": selector,
				"strict": false,
				"state": state.as_protocol(),
				"timeout": millis(timeout),
			}),
		)
		.await
		.map(|_| ())
	}

	/// Non-waiting visibility probe.
	pub async fn is_visible(&self, selector: &str) -> Result<bool> {
		let result = self.frame_call("isVisible", json!({ "selector": selector, "strict": false })).await?;
		Ok(result["value"].as_bool().unwrap_or(false))
	}

	pub async fn query_count(&self, selector: &str) -> Result<usize> {
		let result = self.frame_call("queryCount", json!({ "selector": selector })).await?;
		Ok(result["value"].as_u64().unwrap_or(0) as usize)
	}

	pub async fn click(&self, selector: &str) -> Result<()> {
		self.frame_call(
			"click",
			json!({ "selector": selector, "strict": false, "timeout": DEFAULT_TIMEOUT_MS }),
		)
		.await
		.map(|_| ())
	}

	/// Types `text` key by key with `delay` between keystrokes.
	pub async fn type_text(&self, selector: &str, text: &str, delay: Duration) -> Result<()> {
		self.frame_call(
			"type",
			json!({
				"selector": selector,
				"strict": false,
				"text": text,
				"delay": millis(delay),
				"timeout": DEFAULT_TIMEOUT_MS,
			}),
		)
		.await
		.map(|_| ())
	}

	pub async fn inner_text(&self, selector: &str) -> Result<String> {
		let result = self
			.frame_call(
				"innerText",
				json!({ "selector": selector, "strict": false, "timeout": DEFAULT_TIMEOUT_MS }),
			)
			.await?;
		Ok(result["value"].as_str().unwrap_or_default().to_string())
	}

	pub async fn set_input_files(&self, selector: &str, files: &[FilePayload]) -> Result<()> {
		self.frame_call(
			"setInputFiles",
			json!({
				"selector": selector,
				"strict": false,
				"payloads": files,
				"timeout": DEFAULT_TIMEOUT_MS,
			}),
		)
		.await
		.map(|_| ())
	}

	/// Starts listening for responses of this page whose URL contains `url_part`.
	///
	/// The driver only reports network events to subscribed clients, so the
	/// subscription is enabled on the page first.
	pub async fn listen_responses(&self, url_part: &str) -> Result<ResponseListener> {
		let events = self.connection.subscribe(&self.context, "response");
		self.connection
			.send_message(&self.guid, "updateSubscription", json!({ "event": "response", "enabled": true }))
			.await?;
		Ok(ResponseListener {
			connection: Arc::clone(&self.connection),
			page: self.guid.clone(),
			url_part: url_part.to_string(),
			events,
		})
	}

	/// Presses a key on the page keyboard (e.g. `Enter`).
	pub async fn press(&self, key: &str) -> Result<()> {
		self.connection
			.send_message(&self.guid, "keyboardPress", json!({ "key": key }))
			.await
			.map(|_| ())
	}

	pub async fn close(&self) -> Result<()> {
		self.connection
			.send_message(&self.guid, "close", json!({ "runBeforeUnload": false }))
			.await
			.map(|_| ())
	}
}

impl std::fmt::Debug for Page {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Page")
			.field("guid", &self.guid)
			.field("main_frame", &self.main_frame)
			.finish()
	}
}

/// Stream of a page's responses filtered by URL fragment.
pub struct ResponseListener {
	connection: Arc<Connection>,
	page: String,
	url_part: String,
	events: mpsc::UnboundedReceiver<Event>,
}

impl ResponseListener {
	/// The next matching response; `None` once the connection is gone.
	pub async fn next(&mut self) -> Result<Option<Response>> {
		while let Some(event) = self.events.recv().await {
			if event.params["page"]["guid"].as_str() != Some(self.page.as_str()) {
				continue;
			}
			let guid = guid_field(&event.params, "response")?;
			let Some(object) = self.connection.object(&guid) else {
				tracing::warn!(target = "unipfp.runtime", guid = %guid, "response was never announced");
				continue;
			};

			let url = object.initializer["url"].as_str().unwrap_or_default();
			if !url.contains(&self.url_part) {
				continue;
			}
			return Ok(Some(Response {
				connection: Arc::clone(&self.connection),
				url: url.to_string(),
				status: object.initializer["status"].as_u64().unwrap_or(0) as u16,
				guid,
			}));
		}
		Ok(None)
	}
}

impl std::fmt::Debug for ResponseListener {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ResponseListener")
			.field("page", &self.page)
			.field("url_part", &self.url_part)
			.finish()
	}
}

/// A response received by a page.
#[derive(Clone)]
pub struct Response {
	connection: Arc<Connection>,
	guid: String,
	url: String,
	status: u16,
}

impl Response {
	pub fn url(&self) -> &str {
		&self.url
	}

	pub fn status(&self) -> u16 {
		self.status
	}

	pub async fn body(&self) -> Result<Vec<u8>> {
		let result = self.connection.send_message(&self.guid, "body", json!({})).await?;
		let encoded = result["binary"].as_str().unwrap_or_default();
		STANDARD
			.decode(encoded)
			.map_err(|e| Error::ProtocolError(format!("response body is not base64: {e}")))
	}

	pub async fn json(&self) -> Result<Value> {
		Ok(serde_json::from_slice(&self.body().await?)?)
	}
}

impl std::fmt::Debug for Response {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Response")
			.field("url", &self.url)
			.field("status", &self.status)
			.finish()
	}
}
