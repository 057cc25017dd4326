//! [`Capability`] backed by a Playwright-driven Chromium.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use unipfp_protocol::{FilePayload, StorageState};
use unipfp_runtime::{Browser, BrowserContext, DriverCommand, LaunchOptions, Playwright, ResponseListener, WaitState};

use crate::capability::{BrowsingContext, Capability, ElementState, NetworkResponse, Page, ResponseWatch};
use crate::error::{PfpError, Result};
use crate::image::ImageFile;

/// Browser launch settings.
#[derive(Debug, Clone, Default)]
pub struct LaunchConfig {
	pub headless: bool,
	/// Unpacked Chromium extension to load into every context.
	pub extension: Option<PathBuf>,
	/// Explicit driver command; located automatically when `None`.
	pub driver: Option<DriverCommand>,
}

impl LaunchConfig {
	pub fn args(&self) -> Vec<String> {
		let mut args = vec![
			"--no-sandbox".to_string(),
			"--disable-setuid-sandbox".to_string(),
			"--disable-blink-features=AutomationControlled".to_string(),
		];
		if let Some(extension) = &self.extension {
			args.push(format!("--disable-extensions-except={}", extension.display()));
			args.push(format!("--load-extension={}", extension.display()));
		}
		args
	}
}

pub struct PlaywrightCapability {
	playwright: Playwright,
	browser: Browser,
	closed: AtomicBool,
}

impl PlaywrightCapability {
	pub async fn launch(config: LaunchConfig) -> Result<Self> {
		let playwright = match &config.driver {
			Some(command) => Playwright::launch_with(command).await?,
			None => Playwright::launch().await?,
		};

		let options = LaunchOptions {
			headless: config.headless,
			args: config.args(),
			..LaunchOptions::default()
		};
		let browser = match playwright.chromium().launch(&options).await {
			Ok(browser) => browser,
			Err(err) => {
				let _ = playwright.shutdown().await;
				return Err(err.into());
			}
		};

		tracing::info!(target = "unipfp", headless = config.headless, "chromium launched");
		Ok(Self {
			playwright,
			browser,
			closed: AtomicBool::new(false),
		})
	}
}

#[async_trait]
impl Capability for PlaywrightCapability {
	async fn new_context(&self, seed: Option<&StorageState>) -> Result<Box<dyn BrowsingContext>> {
		let context = self.browser.new_context(seed).await?;
		let page = match context.new_page().await {
			Ok(page) => page,
			Err(err) => {
				let _ = context.close().await;
				return Err(err.into());
			}
		};
		Ok(Box::new(PlaywrightContext {
			context,
			page: PlaywrightPage(page),
		}))
	}

	async fn close(&self) -> Result {
		if self.closed.swap(true, Ordering::SeqCst) {
			return Ok(());
		}
		let closed = self.browser.close().await;
		self.playwright.shutdown().await?;
		closed.map_err(PfpError::from)
	}
}

struct PlaywrightContext {
	context: BrowserContext,
	page: PlaywrightPage,
}

#[async_trait]
impl BrowsingContext for PlaywrightContext {
	fn page(&self) -> &dyn Page {
		&self.page
	}

	async fn storage_state(&self) -> Result<StorageState> {
		Ok(self.context.storage_state().await?)
	}

	async fn close(&self) -> Result {
		Ok(self.context.close().await?)
	}
}

struct PlaywrightPage(unipfp_runtime::Page);

fn wait_state(state: ElementState) -> WaitState {
	match state {
		ElementState::Attached => WaitState::Attached,
		ElementState::Visible => WaitState::Visible,
		ElementState::Hidden => WaitState::Hidden,
	}
}

#[async_trait]
impl Page for PlaywrightPage {
	async fn goto(&self, url: &str) -> Result {
		Ok(self.0.goto(url).await?)
	}

	async fn is_visible(&self, selector: &str) -> Result<bool> {
		Ok(self.0.is_visible(selector).await?)
	}

	async fn wait_for(&self, selector: &str, state: ElementState, timeout: Duration) -> Result {
		Ok(self.0.wait_for_selector(selector, wait_state(state), timeout).await?)
	}

	async fn count(&self, selector: &str) -> Result<usize> {
		Ok(self.0.query_count(selector).await?)
	}

	async fn click(&self, selector: &str) -> Result {
		Ok(self.0.click(selector).await?)
	}

	async fn type_text(&self, selector: &str, text: &str, delay: Duration) -> Result {
		Ok(self.0.type_text(selector, text, delay).await?)
	}

	async fn press(&self, key: &str) -> Result {
		Ok(self.0.press(key).await?)
	}

	async fn inner_text(&self, selector: &str) -> Result<String> {
		Ok(self.0.inner_text(selector).await?)
	}

	async fn set_input_files(&self, selector: &str, image: &ImageFile) -> Result {
		let payload = FilePayload::from_bytes(image.file_name(), image.mime_type(), &image.read()?);
		Ok(self.0.set_input_files(selector, &[payload]).await?)
	}

	async fn watch_responses(&self, url_part: &str) -> Result<Box<dyn ResponseWatch>> {
		Ok(Box::new(PlaywrightResponses(self.0.listen_responses(url_part).await?)))
	}

	async fn close(&self) -> Result {
		Ok(self.0.close().await?)
	}
}

struct PlaywrightResponses(ResponseListener);

#[async_trait]
impl ResponseWatch for PlaywrightResponses {
	async fn next(&mut self, timeout: Duration) -> Result<Option<NetworkResponse>> {
		let response = match tokio::time::timeout(timeout, self.0.next()).await {
			Err(_elapsed) => return Ok(None),
			Ok(received) => received?.ok_or_else(|| PfpError::Browser("browser connection closed".into()))?,
		};

		let json = match response.json().await {
			Ok(json) => Some(json),
			Err(err) => {
				tracing::debug!(target = "unipfp", url = response.url(), error = %err, "response body is not JSON");
				None
			}
		};
		Ok(Some(NetworkResponse {
			url: response.url().to_string(),
			status: response.status(),
			json,
		}))
	}
}
