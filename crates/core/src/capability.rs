//! Browser automation capability as seen by the orchestration engine.
//!
//! The engine and the adapters only talk to these traits. The production
//! implementation lives in [`crate::playwright`]; scripted fakes live in
//! the `testing` module behind the `testing` feature.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use unipfp_protocol::StorageState;

use crate::error::{PfpError, Result};
use crate::image::ImageFile;

/// Element state awaited by [`Page::wait_for`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
	Attached,
	Visible,
	Hidden,
}

/// A single tab. Selectors use Playwright selector syntax, including
/// `>> internal:control=enter-frame >>` to pierce iframes and `>> nth=<i>`.
#[async_trait]
pub trait Page: Send + Sync {
	async fn goto(&self, url: &str) -> Result;

	/// Non-waiting visibility probe.
	async fn is_visible(&self, selector: &str) -> Result<bool>;

	async fn wait_for(&self, selector: &str, state: ElementState, timeout: Duration) -> Result;

	async fn count(&self, selector: &str) -> Result<usize>;

	async fn click(&self, selector: &str) -> Result;

	/// Types `text` key by key, pausing `delay` between keystrokes.
	async fn type_text(&self, selector: &str, text: &str, delay: Duration) -> Result;

	async fn press(&self, key: &str) -> Result;

	async fn inner_text(&self, selector: &str) -> Result<String>;

	async fn set_input_files(&self, selector: &str, image: &ImageFile) -> Result;

	/// Starts recording responses whose URL contains `url_part`. Responses
	/// that arrived before the call are not seen, so arm it before the action
	/// that triggers the request.
	async fn watch_responses(&self, url_part: &str) -> Result<Box<dyn ResponseWatch>>;

	async fn close(&self) -> Result;
}

/// A network response observed by a [`ResponseWatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkResponse {
	pub url: String,
	pub status: u16,
	/// The body parsed as JSON, `None` when it is not JSON.
	pub json: Option<Value>,
}

/// Responses of one page, filtered by URL.
#[async_trait]
pub trait ResponseWatch: Send {
	/// The next matching response, or `None` once `timeout` elapses.
	async fn next(&mut self, timeout: Duration) -> Result<Option<NetworkResponse>>;
}

/// Waits for the first watched response that `accept` approves.
///
/// Fails with [`PfpError::Timeout`] when none arrives within `timeout`.
pub async fn wait_for_response<F>(
	watch: &mut dyn ResponseWatch,
	what: &str,
	timeout: Duration,
	accept: F,
) -> Result<NetworkResponse>
where
	F: Fn(&NetworkResponse) -> bool + Send,
{
	let deadline = Instant::now() + timeout;
	loop {
		let remaining = deadline.saturating_duration_since(Instant::now());
		match watch.next(remaining).await? {
			Some(response) if accept(&response) => {
				tracing::trace!(target = "unipfp", what, url = %response.url, "response observed");
				return Ok(response);
			}
			Some(response) => {
				tracing::trace!(target = "unipfp", what, url = %response.url, status = response.status, "response skipped");
			}
			None => {
				return Err(PfpError::Timeout(format!(
					"{what}: no matching response within {:.1}s",
					timeout.as_secs_f64()
				)));
			}
		}
	}
}

/// An isolated cookie jar with one page.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
	fn page(&self) -> &dyn Page;

	/// Snapshot of the context's cookies and local storage.
	async fn storage_state(&self) -> Result<StorageState>;

	async fn close(&self) -> Result;
}

/// Factory for isolated contexts over one shared browser.
#[async_trait]
pub trait Capability: Send + Sync {
	async fn new_context(&self, seed: Option<&StorageState>) -> Result<Box<dyn BrowsingContext>>;

	/// Closes the underlying browser. Called once, after the run.
	async fn close(&self) -> Result;
}
