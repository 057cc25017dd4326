//! File payloads for `setInputFiles`.

use std::io;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// An in-memory file handed to a file input, base64-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
	pub name: String,
	pub mime_type: String,
	pub buffer: String,
}

impl FilePayload {
	pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
		Self {
			name: name.into(),
			mime_type: mime_type.into(),
			buffer: STANDARD.encode(bytes),
		}
	}

	/// Reads `path` and builds a payload named after its file name.
	pub fn from_path(path: &Path, mime_type: &str) -> io::Result<Self> {
		let bytes = std::fs::read(path)?;
		let name = path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| "upload".to_string());
		Ok(Self::from_bytes(name, mime_type, &bytes))
	}

	/// Decoded payload bytes.
	pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
		STANDARD.decode(&self.buffer)
	}
}
