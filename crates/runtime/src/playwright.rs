//! Driver bootstrap: spawns `playwright run-driver`, wires the transport into a
//! [`Connection`] and performs the `initialize` handshake.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::Child;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::driver::DriverCommand;
use crate::error::{Error, Result};
use crate::objects::Browser;
use crate::transport::{BoxedWriter, pipe};

/// Options for [`BrowserType::launch`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	pub headless: bool,
	pub args: Vec<String>,
	pub timeout: Duration,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			headless: true,
			args: Vec::new(),
			timeout: Duration::from_secs(30),
		}
	}
}

/// A browser engine exposed by the driver (only Chromium is used).
#[derive(Clone)]
pub struct BrowserType {
	connection: Arc<Connection>,
	guid: String,
}

impl BrowserType {
	pub fn guid(&self) -> &str {
		&self.guid
	}

	pub async fn launch(&self, options: &LaunchOptions) -> Result<Browser> {
		tracing::debug!(
			target = "unipfp.runtime",
			headless = options.headless,
			args = ?options.args,
			"launching chromium"
		);

		let result = self
			.connection
			.send_message(
				&self.guid,
				"launch",
				json!({
					"headless": options.headless,
					"args": options.args,
					"timeout": options.timeout.as_millis() as f64,
				}),
			)
			.await
			.map_err(|e| match e {
				Error::ProtocolError(msg) => Error::Launch(msg),
				other => other,
			})?;

		let guid = result["browser"]["guid"]
			.as_str()
			.ok_or_else(|| Error::ProtocolError("launch response is missing 'browser.guid'".into()))?;
		Ok(Browser::new(Arc::clone(&self.connection), guid.to_string()))
	}
}

impl std::fmt::Debug for BrowserType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BrowserType").field("guid", &self.guid).finish()
	}
}

/// A live driver session.
pub struct Playwright {
	connection: Arc<Connection>,
	chromium: BrowserType,
	driver: Mutex<Option<Child>>,
	tasks: Vec<JoinHandle<()>>,
}

impl Playwright {
	/// Locates and spawns the driver, then initializes it.
	pub async fn launch() -> Result<Self> {
		Self::launch_with(&DriverCommand::locate()?).await
	}

	pub async fn launch_with(command: &DriverCommand) -> Result<Self> {
		let (child, stdin, stdout) = command.spawn()?;
		let mut playwright = Self::from_streams(stdin, stdout).await?;
		playwright.driver = Mutex::new(Some(child));
		Ok(playwright)
	}

	/// Runs the protocol over an arbitrary stream pair.
	pub async fn from_streams<W, R>(writer: W, reader: R) -> Result<Self>
	where
		W: AsyncWrite + Send + Unpin + 'static,
		R: AsyncRead + Send + Unpin + 'static,
	{
		let (sender, receiver, message_rx) = pipe(Box::new(writer) as BoxedWriter, reader);
		let connection = Arc::new(Connection::new(sender, message_rx));

		let reader_task = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				tracing::error!(target = "unipfp.runtime", error = %e, "driver transport failed");
			}
		});
		let loop_task = {
			let connection = Arc::clone(&connection);
			tokio::spawn(async move { connection.run().await })
		};

		let result = connection.send_message("", "initialize", json!({ "sdkLanguage": "javascript" })).await?;
		let guid = result["playwright"]["guid"]
			.as_str()
			.ok_or_else(|| Error::ProtocolError("initialize response is missing 'playwright.guid'".into()))?;
		let root = connection
			.object(guid)
			.ok_or_else(|| Error::ProtocolError(format!("playwright object {guid} was never announced")))?;
		let chromium_guid = root.initializer["chromium"]["guid"]
			.as_str()
			.ok_or_else(|| Error::ProtocolError("playwright initializer has no chromium".into()))?
			.to_string();

		tracing::debug!(target = "unipfp.runtime", guid, "driver initialized");

		Ok(Self {
			chromium: BrowserType {
				connection: Arc::clone(&connection),
				guid: chromium_guid,
			},
			connection,
			driver: Mutex::new(None),
			tasks: vec![reader_task, loop_task],
		})
	}

	pub fn chromium(&self) -> &BrowserType {
		&self.chromium
	}

	pub fn connection(&self) -> &Arc<Connection> {
		&self.connection
	}

	/// Stops the driver process and the background tasks.
	pub async fn shutdown(&self) -> Result<()> {
		if let Some(mut child) = self.driver.lock().await.take() {
			if let Err(e) = child.kill().await {
				tracing::warn!(target = "unipfp.runtime", error = %e, "failed to stop driver");
			}
		}
		for task in &self.tasks {
			task.abort();
		}
		Ok(())
	}
}

impl Drop for Playwright {
	fn drop(&mut self) {
		for task in &self.tasks {
			task.abort();
		}
	}
}
