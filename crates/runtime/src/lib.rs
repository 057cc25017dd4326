//! Playwright driver runtime.
//!
//! Speaks the Playwright driver protocol (length-prefixed JSON-RPC over the
//! driver's stdio) and exposes thin channel handles for the handful of
//! browser objects unipfp needs: [`BrowserType`], [`Browser`],
//! [`BrowserContext`] and [`Page`].

pub mod connection;
pub mod driver;
pub mod error;
pub mod objects;
pub mod playwright;
pub mod transport;

/// Default timeout in milliseconds for driver operations, matching Playwright's own default.
pub const DEFAULT_TIMEOUT_MS: f64 = 30000.0;

pub use connection::Connection;
pub use driver::DriverCommand;
pub use error::{Error, Result};
pub use objects::{Browser, BrowserContext, Page, Response, ResponseListener, WaitState};
pub use playwright::{BrowserType, LaunchOptions, Playwright};
