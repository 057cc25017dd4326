//! Session and authentication orchestration for unipfp.
//!
//! A run walks each selected adapter through its lifecycle:
//!
//! - browser-driven adapters ([`BrowserAdapter`]) go through the
//!   [`Orchestrator`]: reuse or establish a session, verify a second factor
//!   if asked, persist the session, then update the picture;
//! - API-driven adapters ([`ApiAdapter`]) fetch their token and update.
//!
//! The [`RunCoordinator`] runs adapters one after another and records one
//! [`PlatformOutcome`] per adapter, so a broken site never aborts the run.

pub mod adapter;
pub mod capability;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod image;
pub mod orchestrator;
pub mod platform;
pub mod playwright;
pub mod session_store;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod totp;
pub mod transition;

pub use adapter::{Adapter, ApiAdapter, BrowserAdapter, Challenge, Lifecycle, LoginOutcome};
pub use capability::{
	BrowsingContext, Capability, ElementState, NetworkResponse, Page, ResponseWatch, wait_for_response,
};
pub use coordinator::{PlatformOutcome, RunCoordinator, RunObserver, RunOutcome};
pub use credentials::Credentials;
pub use error::{ErrorKind, PfpError, Result};
pub use image::{ImageFile, ImageKind};
pub use orchestrator::{Orchestrator, success_message};
pub use platform::PlatformDescriptor;
pub use playwright::{LaunchConfig, PlaywrightCapability};
pub use session_store::{DEFAULT_SESSIONS_DIR, SessionStore, StoredSession};
pub use transition::Transition;

pub use unipfp_protocol::StorageState;
