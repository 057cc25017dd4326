use serde::Serialize;

/// Static identity of a browser-driven platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDescriptor {
	/// Display name, unique across a run.
	pub name: &'static str,
	pub home_url: &'static str,
	pub login_url: &'static str,
	pub settings_url: &'static str,
	/// File stem of the persisted session.
	pub session_key: &'static str,
}
