//! JSON-RPC connection to the Playwright driver.
//!
//! Correlates requests with responses by sequential id and keeps a small
//! registry of remote objects announced through `__create__` events, so that
//! handles can read their initializer (for example a page's main frame guid).
//! Other events are forwarded to subscribers registered with
//! [`Connection::subscribe`].
//!
//! # Message flow
//!
//! 1. A caller invokes [`Connection::send_message`] with a target guid, method and params.
//! 2. The connection allocates an id and parks a oneshot sender in `callbacks`.
//! 3. The request is framed and written by the transport.
//! 4. [`Connection::run`] receives the response and completes the oneshot.
//!
//! The driver always sends `__create__` for an object before the response
//! that references it, and `run` dispatches messages in order, so by the
//! time a caller observes a guid its initializer is registered.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::error::{Error, Result};
use crate::transport::{BoxedWriter, PipeSender};

/// Request sent to the driver.
///
/// ```json
/// { "id": 7, "guid": "frame@3ee5", "method": "click", "params": { "selector": "#go" }, "metadata": {} }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	pub id: u32,
	pub guid: String,
	pub method: String,
	pub params: Value,
	pub metadata: Value,
}

/// Response from the driver; `result` and `error` are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorWrapper>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorWrapper {
	pub error: ErrorPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	/// Error type name, e.g. `TimeoutError` or `TargetClosedError`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

/// Event emitted by a remote object (no `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	pub guid: String,
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

/// Responses carry an `id`, events do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Response(Response),
	Event(Event),
}

/// Type name and initializer of an object created by the driver.
#[derive(Debug, Clone)]
pub struct RemoteObject {
	pub type_name: String,
	pub initializer: Value,
}

struct Subscriber {
	guid: String,
	method: String,
	tx: mpsc::UnboundedSender<Event>,
}

/// Connection to a running Playwright driver.
pub struct Connection {
	last_id: AtomicU32,
	closed: AtomicBool,
	callbacks: Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>,
	sender: Mutex<PipeSender<BoxedWriter>>,
	message_rx: Mutex<Option<mpsc::UnboundedReceiver<Value>>>,
	objects: parking_lot::Mutex<HashMap<String, RemoteObject>>,
	subscribers: parking_lot::Mutex<Vec<Subscriber>>,
}

impl Connection {
	pub fn new(sender: PipeSender<BoxedWriter>, message_rx: mpsc::UnboundedReceiver<Value>) -> Self {
		Self {
			last_id: AtomicU32::new(0),
			closed: AtomicBool::new(false),
			callbacks: Mutex::new(HashMap::new()),
			sender: Mutex::new(sender),
			message_rx: Mutex::new(Some(message_rx)),
			objects: parking_lot::Mutex::new(HashMap::new()),
			subscribers: parking_lot::Mutex::new(Vec::new()),
		}
	}

	/// Sends `method` to the object `guid` and awaits its result.
	pub async fn send_message(&self, guid: &str, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		{
			let mut callbacks = self.callbacks.lock().await;
			if self.closed.load(Ordering::SeqCst) {
				return Err(Error::ChannelClosed);
			}
			callbacks.insert(id, tx);
		}

		let request = Request {
			id,
			guid: guid.to_string(),
			method: method.to_string(),
			params,
			metadata: json!({}),
		};

		tracing::trace!(target = "unipfp.runtime", id, guid, method, "sending request");

		let request_value = serde_json::to_value(&request)?;
		if let Err(e) = self.sender.lock().await.send(&request_value).await {
			self.callbacks.lock().await.remove(&id);
			return Err(e);
		}

		rx.await.map_err(|_| Error::ChannelClosed).and_then(|result| result)
	}

	/// Returns the registered object for `guid`, if the driver announced one.
	pub fn object(&self, guid: &str) -> Option<RemoteObject> {
		self.objects.lock().get(guid).cloned()
	}

	/// Receives every `method` event emitted by `guid` from now on. Dropping
	/// the receiver unsubscribes.
	pub fn subscribe(&self, guid: &str, method: &str) -> mpsc::UnboundedReceiver<Event> {
		let (tx, rx) = mpsc::unbounded_channel();
		self.subscribers.lock().push(Subscriber {
			guid: guid.to_string(),
			method: method.to_string(),
			tx,
		});
		rx
	}

	/// Dispatches inbound messages until the transport closes.
	///
	/// Pending requests are failed with [`Error::ChannelClosed`] once the loop ends.
	pub async fn run(&self) {
		let Some(mut message_rx) = self.message_rx.lock().await.take() else {
			tracing::warn!(target = "unipfp.runtime", "connection loop already running");
			return;
		};

		while let Some(message_value) = message_rx.recv().await {
			match serde_json::from_value::<Message>(message_value.clone()) {
				Ok(message) => {
					if let Err(e) = self.dispatch(message).await {
						tracing::error!(target = "unipfp.runtime", error = %e, "error dispatching message");
					}
				}
				Err(e) => {
					tracing::error!(target = "unipfp.runtime", error = %e, message = %message_value, "failed to parse message");
				}
			}
		}

		tracing::debug!(target = "unipfp.runtime", "message loop ended (transport closed)");
		let mut callbacks = self.callbacks.lock().await;
		self.closed.store(true, Ordering::SeqCst);
		callbacks.clear();
		self.subscribers.lock().clear();
	}

	async fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self
					.callbacks
					.lock()
					.await
					.remove(&response.id)
					.ok_or_else(|| Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id)))?;

				let result = match response.error {
					Some(wrapper) => Err(parse_protocol_error(wrapper.error)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				let _ = callback.send(result);
				Ok(())
			}
			Message::Event(event) => {
				self.handle_event(event);
				Ok(())
			}
		}
	}

	fn handle_event(&self, event: Event) {
		match event.method.as_str() {
			"__create__" => {
				let (Some(guid), Some(type_name)) = (event.params["guid"].as_str(), event.params["type"].as_str()) else {
					tracing::warn!(target = "unipfp.runtime", params = %event.params, "malformed __create__ event");
					return;
				};
				self.objects.lock().insert(
					guid.to_string(),
					RemoteObject {
						type_name: type_name.to_string(),
						initializer: event.params["initializer"].clone(),
					},
				);
			}
			"__dispose__" => {
				self.objects.lock().remove(&event.guid);
			}
			_ => {
				let mut subscribers = self.subscribers.lock();
				subscribers.retain(|s| !s.tx.is_closed());
				let mut delivered = false;
				for subscriber in subscribers.iter().filter(|s| s.guid == event.guid && s.method == event.method) {
					delivered |= subscriber.tx.send(event.clone()).is_ok();
				}
				if !delivered {
					tracing::trace!(target = "unipfp.runtime", guid = %event.guid, method = %event.method, "event ignored");
				}
			}
		}
	}
}

fn parse_protocol_error(error: ErrorPayload) -> Error {
	match error.name.as_deref() {
		Some("TimeoutError") => Error::Timeout(error.message),
		Some("TargetClosedError") => Error::TargetClosed(error.message),
		_ => Error::ProtocolError(error.message),
	}
}
