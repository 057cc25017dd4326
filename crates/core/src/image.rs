//! The validated image handed to every adapter.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{PfpError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
	Jpeg,
	Png,
	Gif,
}

impl ImageKind {
	/// Case-insensitive lookup by file extension (without the dot).
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_ascii_lowercase().as_str() {
			"jpg" | "jpeg" => Some(ImageKind::Jpeg),
			"png" => Some(ImageKind::Png),
			"gif" => Some(ImageKind::Gif),
			_ => None,
		}
	}

	pub fn mime_type(self) -> &'static str {
		match self {
			ImageKind::Jpeg => "image/jpeg",
			ImageKind::Png => "image/png",
			ImageKind::Gif => "image/gif",
		}
	}
}

/// An existing image file of a supported type, with an absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
	path: PathBuf,
	kind: ImageKind,
}

impl ImageFile {
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();

		let kind = path
			.extension()
			.and_then(|e| e.to_str())
			.and_then(ImageKind::from_extension)
			.ok_or_else(|| {
				PfpError::UnsupportedImage(format!(
					"{} (expected .jpg, .jpeg, .png or .gif)",
					path.display()
				))
			})?;

		if !path.is_file() {
			return Err(PfpError::MissingImage(path.to_path_buf()));
		}

		let path = std::path::absolute(path).map_err(|_| PfpError::MissingImage(path.to_path_buf()))?;
		Ok(Self { path, kind })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn kind(&self) -> ImageKind {
		self.kind
	}

	pub fn mime_type(&self) -> &'static str {
		self.kind.mime_type()
	}

	pub fn file_name(&self) -> String {
		self.path
			.file_name()
			.map(|n| n.to_string_lossy().into_owned())
			.unwrap_or_else(|| "avatar".to_string())
	}

	pub fn read(&self) -> Result<Vec<u8>> {
		std::fs::read(&self.path).map_err(|_| PfpError::MissingImage(self.path.clone()))
	}
}
