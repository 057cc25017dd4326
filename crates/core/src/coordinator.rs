//! Sequential, failure-isolated runs over the selected adapters.

use serde::Serialize;
use serde::ser::SerializeStruct;

use crate::adapter::{Adapter, ApiAdapter};
use crate::capability::Capability;
use crate::error::{PfpError, Result};
use crate::image::ImageFile;
use crate::orchestrator::{Orchestrator, success_message};

/// Result of one adapter invocation.
#[derive(Debug)]
pub struct PlatformOutcome {
	pub platform: &'static str,
	pub result: Result<String>,
}

impl PlatformOutcome {
	pub fn is_ok(&self) -> bool {
		self.result.is_ok()
	}
}

impl Serialize for PlatformOutcome {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut s = serializer.serialize_struct("PlatformOutcome", 4)?;
		s.serialize_field("platform", self.platform)?;
		s.serialize_field("ok", &self.result.is_ok())?;
		match &self.result {
			Ok(message) => {
				s.serialize_field("message", message)?;
				s.skip_field("kind")?;
			}
			Err(err) => {
				s.serialize_field("message", &err.to_string())?;
				s.serialize_field("kind", &err.kind())?;
			}
		}
		s.end()
	}
}

/// Outcomes in selection order, one per adapter.
#[derive(Debug, Default, Serialize)]
pub struct RunOutcome {
	outcomes: Vec<PlatformOutcome>,
}

impl RunOutcome {
	fn record(&mut self, outcome: PlatformOutcome) {
		self.outcomes.push(outcome);
	}

	pub fn len(&self) -> usize {
		self.outcomes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.outcomes.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, PlatformOutcome> {
		self.outcomes.iter()
	}

	pub fn succeeded(&self) -> impl Iterator<Item = &PlatformOutcome> {
		self.outcomes.iter().filter(|o| o.is_ok())
	}

	pub fn failed(&self) -> impl Iterator<Item = &PlatformOutcome> {
		self.outcomes.iter().filter(|o| !o.is_ok())
	}

	pub fn all_ok(&self) -> bool {
		self.outcomes.iter().all(PlatformOutcome::is_ok)
	}
}

impl<'a> IntoIterator for &'a RunOutcome {
	type Item = &'a PlatformOutcome;
	type IntoIter = std::slice::Iter<'a, PlatformOutcome>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Progress hooks for rendering a run.
pub trait RunObserver: Send + Sync {
	fn on_start(&self, _index: usize, _total: usize, _platform: &str) {}

	fn on_finish(&self, _outcome: &PlatformOutcome) {}
}

pub struct RunCoordinator {
	orchestrator: Orchestrator,
	observer: Option<Box<dyn RunObserver>>,
}

impl RunCoordinator {
	pub fn new(orchestrator: Orchestrator) -> Self {
		Self {
			orchestrator,
			observer: None,
		}
	}

	pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
		self.observer = Some(Box::new(observer));
		self
	}

	pub fn orchestrator(&self) -> &Orchestrator {
		&self.orchestrator
	}

	/// Runs every adapter exactly once, in order. A failing adapter is
	/// recorded and the run continues with the next one.
	pub async fn run(&self, capability: Option<&dyn Capability>, adapters: &[Adapter], image: &ImageFile) -> RunOutcome {
		let mut outcome = RunOutcome::default();

		for (index, adapter) in adapters.iter().enumerate() {
			let platform = adapter.name();
			if let Some(observer) = &self.observer {
				observer.on_start(index, adapters.len(), platform);
			}

			let result = match adapter {
				Adapter::Browser(adapter) => match capability {
					Some(capability) => self.orchestrator.run(capability, adapter.as_ref(), image).await,
					None => Err(PfpError::config(format!("{platform} needs a browser, but none was launched."))),
				},
				Adapter::Api(adapter) => run_token(adapter.as_ref(), image).await,
			};

			match &result {
				Ok(message) => tracing::info!(target = "unipfp", platform, message = message.as_str(), "platform updated"),
				Err(err) => tracing::error!(target = "unipfp", platform, kind = %err.kind(), error = %err, "platform failed"),
			}

			let platform_outcome = PlatformOutcome { platform, result };
			if let Some(observer) = &self.observer {
				observer.on_finish(&platform_outcome);
			}
			outcome.record(platform_outcome);
		}

		outcome
	}
}

async fn run_token(adapter: &dyn ApiAdapter, image: &ImageFile) -> Result<String> {
	let token = adapter.token()?;
	adapter.perform_update(token, image).await?;
	Ok(success_message(adapter.name()))
}
