//! Error taxonomy shared by every adapter and the orchestration engine.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type used throughout unipfp. `T` defaults to `()`.
pub type Result<T = (), E = PfpError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PfpError {
	#[error("{0}")]
	Config(String),

	#[error("Invalid TOTP secret: {0}")]
	InvalidTotpSecret(String),

	#[error("Unsupported image type: {0}")]
	UnsupportedImage(String),

	#[error("Image file not found: {}", .0.display())]
	MissingImage(PathBuf),

	#[error("{0}")]
	Authentication(String),

	#[error("{0}")]
	UnexpectedState(String),

	#[error("Timed out: {0}")]
	Timeout(String),

	#[error("Browser error: {0}")]
	Browser(String),

	#[error("HTTP error: {0}")]
	Http(String),

	#[error("Session store error at {}: {source}", path.display())]
	SessionStore {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Malformed session file {}: {source}", path.display())]
	SessionFormat {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

/// Coarse classification of a [`PfpError`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Configuration,
	Authentication,
	UnexpectedState,
	Transport,
	Storage,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ErrorKind::Configuration => "configuration",
			ErrorKind::Authentication => "authentication",
			ErrorKind::UnexpectedState => "unexpected state",
			ErrorKind::Transport => "transport",
			ErrorKind::Storage => "storage",
		})
	}
}

impl PfpError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			PfpError::Config(_) | PfpError::InvalidTotpSecret(_) | PfpError::UnsupportedImage(_) | PfpError::MissingImage(_) => {
				ErrorKind::Configuration
			}
			PfpError::Authentication(_) => ErrorKind::Authentication,
			PfpError::UnexpectedState(_) => ErrorKind::UnexpectedState,
			PfpError::Timeout(_) | PfpError::Browser(_) | PfpError::Http(_) => ErrorKind::Transport,
			PfpError::SessionStore { .. } | PfpError::SessionFormat { .. } => ErrorKind::Storage,
		}
	}

	pub fn config(message: impl Into<String>) -> Self {
		PfpError::Config(message.into())
	}

	pub fn authentication(message: impl Into<String>) -> Self {
		PfpError::Authentication(message.into())
	}

	pub fn unexpected(message: impl Into<String>) -> Self {
		PfpError::UnexpectedState(message.into())
	}
}

impl From<unipfp_runtime::Error> for PfpError {
	fn from(err: unipfp_runtime::Error) -> Self {
		match err {
			unipfp_runtime::Error::Timeout(msg) => PfpError::Timeout(msg),
			other => PfpError::Browser(other.to_string()),
		}
	}
}
