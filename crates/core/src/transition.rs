//! Waiting for the first of several page states to appear.
//!
//! After submitting a form a site may show an error banner, the logged-in
//! shell, or a second-factor prompt. A [`Transition`] lists the selectors
//! for each outcome and polls them in registration order until one is
//! visible or the deadline passes.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::capability::Page;
use crate::error::{PfpError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct Transition<T> {
	arms: Vec<(String, T)>,
	timeout: Duration,
	poll_interval: Duration,
}

impl<T: Clone> Transition<T> {
	pub fn new() -> Self {
		Self {
			arms: Vec::new(),
			timeout: DEFAULT_TIMEOUT,
			poll_interval: DEFAULT_POLL_INTERVAL,
		}
	}

	/// Registers `outcome` for when `selector` becomes visible.
	pub fn on(mut self, selector: impl Into<String>, outcome: T) -> Self {
		self.arms.push((selector.into(), outcome));
		self
	}

	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}

	/// Returns the outcome of the first visible selector. Earlier arms win
	/// when several are visible in the same poll.
	pub async fn wait(&self, page: &dyn Page, what: &str) -> Result<T> {
		let deadline = Instant::now() + self.timeout;
		loop {
			for (selector, outcome) in &self.arms {
				if page.is_visible(selector).await? {
					tracing::trace!(target = "unipfp", what, selector = selector.as_str(), "transition observed");
					return Ok(outcome.clone());
				}
			}

			if Instant::now() >= deadline {
				let selectors: Vec<&str> = self.arms.iter().map(|(s, _)| s.as_str()).collect();
				return Err(PfpError::Timeout(format!(
					"{what}: none of {selectors:?} appeared within {:.1}s",
					self.timeout.as_secs_f64()
				)));
			}

			sleep(self.poll_interval).await;
		}
	}
}

impl<T: Clone> Default for Transition<T> {
	fn default() -> Self {
		Self::new()
	}
}
