use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Pfp(#[from] unipfp::PfpError),

	#[error("Could not read config file {}: {source}", path.display())]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid config file {}: {source}", path.display())]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Invalid config file {}: {message}", path.display())]
	ConfigValue { path: PathBuf, message: String },

	#[error("Something went wrong while creating a Chromium browser: {0}")]
	Launch(#[source] unipfp::PfpError),

	#[error("No saved session for {0}")]
	NoSession(&'static str),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
