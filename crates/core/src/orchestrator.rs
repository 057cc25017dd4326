//! Session lifecycle for browser-driven adapters.
//!
//! ```text
//! load session ─► new context ─► check_status ─┬─ true ──────────────────────────┐
//!                                              └─ false ─► login ─┬─ Authenticated ┤
//!                                                                 └─ challenge ─► verify
//!                                                                                  │
//!                              close page + context ◄─ update ◄─ persist session ◄─┘
//! ```
//!
//! Any `Err` short-circuits the remaining steps. The page and context are
//! closed on every path and close failures never replace the lifecycle result.

use crate::adapter::{BrowserAdapter, LoginOutcome};
use crate::capability::{BrowsingContext, Capability};
use crate::error::Result;
use crate::image::ImageFile;
use crate::session_store::SessionStore;

pub fn success_message(platform: &str) -> String {
	format!("Successfully updated pfp on {platform}.")
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
	store: SessionStore,
}

impl Orchestrator {
	pub fn new(store: SessionStore) -> Self {
		Self { store }
	}

	pub fn store(&self) -> &SessionStore {
		&self.store
	}

	pub async fn run(&self, capability: &dyn Capability, adapter: &dyn BrowserAdapter, image: &ImageFile) -> Result<String> {
		let descriptor = adapter.descriptor();

		let seed = match self.store.load(descriptor.session_key) {
			Ok(seed) => seed,
			Err(err) => {
				tracing::warn!(
					target = "unipfp.session",
					platform = descriptor.name,
					error = %err,
					"ignoring unreadable session"
				);
				None
			}
		};
		tracing::debug!(
			target = "unipfp.session",
			platform = descriptor.name,
			seeded = seed.is_some(),
			"opening context"
		);

		let context = capability.new_context(seed.as_ref()).await?;
		let result = self.drive(context.as_ref(), adapter, image).await;

		if let Err(err) = context.page().close().await {
			tracing::warn!(target = "unipfp", platform = descriptor.name, error = %err, "failed to close page");
		}
		if let Err(err) = context.close().await {
			tracing::warn!(target = "unipfp", platform = descriptor.name, error = %err, "failed to close context");
		}

		result.map(|()| success_message(descriptor.name))
	}

	async fn drive(&self, context: &dyn BrowsingContext, adapter: &dyn BrowserAdapter, image: &ImageFile) -> Result {
		let descriptor = adapter.descriptor();
		let page = context.page();

		if adapter.check_status(page).await? {
			tracing::info!(target = "unipfp.session", platform = descriptor.name, "reusing session");
		} else {
			tracing::info!(target = "unipfp.session", platform = descriptor.name, "logging in");
			match adapter.perform_login(page).await? {
				LoginOutcome::Authenticated => {}
				LoginOutcome::NeedsVerification(challenge) => {
					tracing::info!(
						target = "unipfp.session",
						platform = descriptor.name,
						%challenge,
						"verifying"
					);
					adapter.perform_verify(page, challenge).await?;
				}
			}
		}

		let state = context.storage_state().await?;
		self.store.persist(descriptor.session_key, &state)?;

		adapter.perform_update(page, image).await
	}
}
