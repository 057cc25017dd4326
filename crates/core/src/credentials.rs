//! Per-platform credentials injected into adapters at construction.

use std::fmt;

use serde::Deserialize;

use crate::error::{PfpError, Result};
use crate::totp;

/// Login material for one platform. Empty strings count as absent.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credentials {
	/// Username or email.
	pub identifier: Option<String>,
	/// Password, or the API token for token-based platforms.
	pub secret: Option<String>,
	/// Base32 TOTP seed.
	pub totp_secret: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
	value.as_deref().filter(|v| !v.trim().is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|v| !v.trim().is_empty())
}

impl Credentials {
	pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
		Self {
			identifier: Some(identifier.into()),
			secret: Some(secret.into()),
			totp_secret: None,
		}
	}

	pub fn with_totp_secret(mut self, totp_secret: impl Into<String>) -> Self {
		self.totp_secret = Some(totp_secret.into());
		self
	}

	/// Fields set in `other` replace the ones in `self`; blank ones do not.
	pub fn overlay(self, other: Credentials) -> Self {
		Self {
			identifier: non_blank(other.identifier).or(self.identifier),
			secret: non_blank(other.secret).or(self.secret),
			totp_secret: non_blank(other.totp_secret).or(self.totp_secret),
		}
	}

	pub fn require_identifier(&self, platform: &str) -> Result<&str> {
		present(&self.identifier).ok_or_else(|| missing_login(platform))
	}

	/// Identifier and password, both required.
	pub fn require_login(&self, platform: &str) -> Result<(&str, &str)> {
		match (present(&self.identifier), present(&self.secret)) {
			(Some(identifier), Some(secret)) => Ok((identifier, secret)),
			_ => Err(missing_login(platform)),
		}
	}

	/// The secret alone, for token-authenticated platforms.
	pub fn require_secret(&self, platform: &str) -> Result<&str> {
		present(&self.secret).ok_or_else(|| {
			PfpError::config(format!(
				"Could not find the {platform} secret. Please check out your environment file."
			))
		})
	}

	/// Current TOTP code. Only fails when a challenge is actually reached.
	pub fn totp_code(&self, platform: &str) -> Result<String> {
		let secret = present(&self.totp_secret).ok_or_else(|| {
			PfpError::config(format!(
				"Could not find the {platform} TOTP secret. Please check out your environment file."
			))
		})?;
		totp::generate(secret)
	}

	pub fn is_empty(&self) -> bool {
		present(&self.identifier).is_none() && present(&self.secret).is_none() && present(&self.totp_secret).is_none()
	}
}

fn missing_login(platform: &str) -> PfpError {
	PfpError::config(format!(
		"Could not find the {platform} username or password. Please check out your environment file."
	))
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let redact = |v: &Option<String>| present(v).map(|_| "<redacted>");
		f.debug_struct("Credentials")
			.field("identifier", &redact(&self.identifier))
			.field("secret", &redact(&self.secret))
			.field("totp_secret", &redact(&self.totp_secret))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn debug_never_prints_values() {
		let creds = Credentials::new("octocat", "hunter2").with_totp_secret("JBSWY3DPEHPK3PXP");
		let rendered = format!("{creds:?}");
		assert!(!rendered.contains("octocat"));
		assert!(!rendered.contains("hunter2"));
		assert!(!rendered.contains("JBSWY3DPEHPK3PXP"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn missing_fields_surface_as_config_errors() {
		let creds = Credentials {
			identifier: Some("octocat".into()),
			secret: Some("   ".into()),
			totp_secret: None,
		};

		let err = creds.require_login("GitHub").unwrap_err();
		assert_eq!(
			err.to_string(),
			"Could not find the GitHub username or password. Please check out your environment file."
		);
		assert_eq!(creds.require_identifier("GitHub").unwrap(), "octocat");
		assert!(matches!(creds.totp_code("GitHub"), Err(PfpError::Config(msg)) if msg.contains("TOTP secret")));
	}

	#[test]
	fn malformed_totp_secret_is_reported_at_use() {
		let creds = Credentials::new("a", "b").with_totp_secret("!!!");
		assert!(matches!(creds.totp_code("Twitch"), Err(PfpError::InvalidTotpSecret(_))));
	}

	#[test]
	fn overlay_prefers_set_fields() {
		let file = Credentials::new("file-user", "file-pass").with_totp_secret("FILESECRET");
		let env = Credentials {
			secret: Some("env-pass".into()),
			..Credentials::default()
		};

		let merged = file.overlay(env);
		assert_eq!(merged.require_login("X").unwrap(), ("file-user", "env-pass"));
		assert_eq!(merged.totp_secret.as_deref(), Some("FILESECRET"));
	}

	#[test]
	fn blank_fields_do_not_mask_lower_layers() {
		let instagram = Credentials::new("sunset.pics", "real-pw").with_totp_secret("JBSWY3DPEHPK3PXP");
		let threads = Credentials {
			identifier: Some(String::new()),
			secret: Some("".into()),
			totp_secret: Some("  ".into()),
		};

		let merged = instagram.overlay(threads);
		assert_eq!(merged.require_login("Threads").unwrap(), ("sunset.pics", "real-pw"));
		assert_eq!(merged.totp_secret.as_deref(), Some("JBSWY3DPEHPK3PXP"));
	}

	#[test]
	fn deserializes_camel_case_config_entries() {
		let creds: Credentials =
			serde_json::from_str(r#"{"identifier":"me@example.com","totpSecret":"JBSWY3DPEHPK3PXP"}"#).unwrap();
		assert_eq!(creds.identifier.as_deref(), Some("me@example.com"));
		assert!(creds.secret.is_none());
		assert!(!creds.is_empty());
	}
}
