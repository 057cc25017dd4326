//! Per-platform persisted browser sessions.
//!
//! One Playwright `storageState` document per session key, stored as
//! `<dir>/<session_key>.json`. Writes go to a temporary sibling and are
//! renamed into place, so a reader never observes a partial document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use unipfp_protocol::StorageState;

use crate::error::{PfpError, Result};

/// Directory used when neither the config file nor the CLI names one.
pub const DEFAULT_SESSIONS_DIR: &str = "cookies";

/// Summary of a stored session, as shown by `unipfp sessions list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
	pub key: String,
	pub path: PathBuf,
	/// `None` when the file could not be parsed.
	pub cookies: Option<usize>,
	pub earliest_expiry: Option<f64>,
	#[serde(skip)]
	pub modified: Option<SystemTime>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
	dir: PathBuf,
}

impl SessionStore {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path_for(&self, session_key: &str) -> PathBuf {
		self.dir.join(format!("{session_key}.json"))
	}

	/// Loads the session for `session_key`. A missing file is `Ok(None)`.
	pub fn load(&self, session_key: &str) -> Result<Option<StorageState>> {
		let path = self.path_for(session_key);
		let content = match fs::read_to_string(&path) {
			Ok(content) => content,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(source) => return Err(PfpError::SessionStore { path, source }),
		};

		StorageState::from_json(&content)
			.map(Some)
			.map_err(|source| PfpError::SessionFormat { path, source })
	}

	/// Replaces the stored session for `session_key`.
	pub fn persist(&self, session_key: &str, state: &StorageState) -> Result {
		let path = self.path_for(session_key);
		let json = state.to_json_pretty().map_err(|source| PfpError::SessionFormat {
			path: path.clone(),
			source,
		})?;

		fs::create_dir_all(&self.dir).map_err(|source| PfpError::SessionStore {
			path: self.dir.clone(),
			source,
		})?;

		let tmp = self.dir.join(format!(".{session_key}.json.tmp"));
		let written = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &path));
		if let Err(source) = written {
			let _ = fs::remove_file(&tmp);
			return Err(PfpError::SessionStore { path, source });
		}

		tracing::debug!(
			target = "unipfp.session",
			session_key,
			cookies = state.cookies.len(),
			path = %path.display(),
			"session persisted"
		);
		Ok(())
	}

	/// Removes the stored session. Returns `false` when none existed.
	pub fn clear(&self, session_key: &str) -> Result<bool> {
		let path = self.path_for(session_key);
		match fs::remove_file(&path) {
			Ok(()) => Ok(true),
			Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
			Err(source) => Err(PfpError::SessionStore { path, source }),
		}
	}

	/// Lists stored sessions sorted by key. A missing directory is empty.
	pub fn list(&self) -> Result<Vec<StoredSession>> {
		let entries = match fs::read_dir(&self.dir) {
			Ok(entries) => entries,
			Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(source) => {
				return Err(PfpError::SessionStore {
					path: self.dir.clone(),
					source,
				});
			}
		};

		let mut sessions = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|source| PfpError::SessionStore {
				path: self.dir.clone(),
				source,
			})?;
			let path = entry.path();
			let Some(key) = path
				.file_name()
				.and_then(|n| n.to_str())
				.filter(|n| !n.starts_with('.'))
				.and_then(|n| n.strip_suffix(".json"))
				.map(String::from)
			else {
				continue;
			};

			let state = StorageState::from_file(&path).ok();
			sessions.push(StoredSession {
				cookies: state.as_ref().map(|s| s.cookies.len()),
				earliest_expiry: state.as_ref().and_then(StorageState::earliest_expiry),
				modified: entry.metadata().and_then(|m| m.modified()).ok(),
				key,
				path,
			});
		}

		sessions.sort_by(|a, b| a.key.cmp(&b.key));
		Ok(sessions)
	}
}

impl Default for SessionStore {
	fn default() -> Self {
		Self::new(DEFAULT_SESSIONS_DIR)
	}
}
