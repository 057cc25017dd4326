//! The contract every platform adapter implements.

use std::fmt;

use async_trait::async_trait;

use crate::capability::Page;
use crate::error::{PfpError, Result};
use crate::image::ImageFile;
use crate::platform::PlatformDescriptor;

/// Second factor a login stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Challenge {
	/// A one-time code input from an authenticator app.
	Totp,
	/// Approval pushed to the user's phone.
	DeviceApproval,
}

impl fmt::Display for Challenge {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Challenge::Totp => "TOTP",
			Challenge::DeviceApproval => "device approval",
		})
	}
}

/// What a submitted login led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
	Authenticated,
	NeedsVerification(Challenge),
}

/// An adapter that authenticates through a persisted browser session.
#[async_trait]
pub trait BrowserAdapter: Send + Sync {
	fn descriptor(&self) -> &PlatformDescriptor;

	/// `Ok(true)` when the seeded session is already logged in.
	async fn check_status(&self, page: &dyn Page) -> Result<bool>;

	async fn perform_login(&self, page: &dyn Page) -> Result<LoginOutcome>;

	async fn perform_verify(&self, _page: &dyn Page, challenge: Challenge) -> Result {
		Err(PfpError::unexpected(format!(
			"{} asked for {challenge} verification, which is not supported.",
			self.descriptor().name
		)))
	}

	async fn perform_update(&self, page: &dyn Page, image: &ImageFile) -> Result;

	/// Notice shown to the user before the run starts.
	fn warning(&self) -> Option<&'static str> {
		None
	}
}

/// An adapter that authenticates with a static credential.
#[async_trait]
pub trait ApiAdapter: Send + Sync {
	fn name(&self) -> &'static str;

	fn token(&self) -> Result<&str>;

	async fn perform_update(&self, token: &str, image: &ImageFile) -> Result;

	fn warning(&self) -> Option<&'static str> {
		None
	}
}

/// Lifecycle shape an adapter runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	/// status check, login, verification, persistence, update.
	Session,
	/// credential, update.
	Token,
}

pub enum Adapter {
	Browser(Box<dyn BrowserAdapter>),
	Api(Box<dyn ApiAdapter>),
}

impl Adapter {
	pub fn name(&self) -> &'static str {
		match self {
			Adapter::Browser(adapter) => adapter.descriptor().name,
			Adapter::Api(adapter) => adapter.name(),
		}
	}

	pub fn lifecycle(&self) -> Lifecycle {
		match self {
			Adapter::Browser(_) => Lifecycle::Session,
			Adapter::Api(_) => Lifecycle::Token,
		}
	}

	pub fn warning(&self) -> Option<&'static str> {
		match self {
			Adapter::Browser(adapter) => adapter.warning(),
			Adapter::Api(adapter) => adapter.warning(),
		}
	}
}

impl fmt::Debug for Adapter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Adapter")
			.field("name", &self.name())
			.field("lifecycle", &self.lifecycle())
			.finish()
	}
}
