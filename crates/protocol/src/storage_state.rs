//! Browser storage snapshot (cookies plus per-origin local storage).

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// `SameSite` attribute of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
	Strict,
	Lax,
	None,
}

/// A single cookie as stored in a Playwright storage-state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Unix timestamp in seconds; `-1` marks a session cookie.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

impl Cookie {
	/// Returns `true` when the cookie carries an expiry at or before `now` (unix seconds).
	pub fn is_expired_at(&self, now: f64) -> bool {
		matches!(self.expires, Some(ts) if ts >= 0.0 && ts <= now)
	}
}

/// A `localStorage` key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
	pub name: String,
	pub value: String,
}

/// Local storage captured for one origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
	pub origin: String,
	#[serde(default)]
	pub local_storage: Vec<NameValue>,
}

/// Authentication snapshot of a browser context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
	#[serde(default)]
	pub cookies: Vec<Cookie>,
	#[serde(default)]
	pub origins: Vec<OriginState>,
}

impl StorageState {
	/// Returns `true` when the snapshot holds neither cookies nor local storage.
	pub fn is_empty(&self) -> bool {
		self.cookies.is_empty() && self.origins.iter().all(|o| o.local_storage.is_empty())
	}

	/// Number of cookies whose expiry lies in the past relative to `now` (unix seconds).
	pub fn expired_cookie_count(&self, now: f64) -> usize {
		self.cookies.iter().filter(|c| c.is_expired_at(now)).count()
	}

	/// Earliest non-session cookie expiry, if any.
	pub fn earliest_expiry(&self) -> Option<f64> {
		self.cookies
			.iter()
			.filter_map(|c| c.expires)
			.filter(|ts| *ts >= 0.0)
			.reduce(f64::min)
	}

	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}

	pub fn to_json_pretty(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(self)
	}

	/// Reads a storage-state document from disk.
	pub fn from_file(path: &Path) -> io::Result<Self> {
		let content = fs::read_to_string(path)?;
		Self::from_json(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
	}

	/// Writes the snapshot to `path` as pretty-printed JSON.
	pub fn to_file(&self, path: &Path) -> io::Result<()> {
		let json = self
			.to_json_pretty()
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
		fs::write(path, json)
	}
}
