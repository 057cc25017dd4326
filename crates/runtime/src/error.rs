use thiserror::Error;

/// Errors raised by the driver runtime.
#[derive(Debug, Error)]
pub enum Error {
	#[error("Playwright driver not found: {0}")]
	DriverNotFound(String),

	#[error("Failed to launch Playwright driver: {0}")]
	Launch(String),

	/// The driver reported a `TimeoutError`.
	#[error("Timeout: {0}")]
	Timeout(String),

	#[error("Target closed: {0}")]
	TargetClosed(String),

	#[error("Protocol error: {0}")]
	ProtocolError(String),

	#[error("Connection closed before a response arrived")]
	ChannelClosed,

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
