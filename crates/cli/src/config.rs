//! Settings resolution: config file, then environment, then command-line flags.
//!
//! The config file is JSON:
//!
//! ```json
//! {
//!   "sessionsDir": "cookies",
//!   "headless": false,
//!   "extension": "./extension",
//!   "credentials": {
//!     "github": { "identifier": "octocat", "secret": "…", "totpSecret": "…" }
//!   }
//! }
//! ```
//!
//! Credentials from the environment use the platform prefix:
//! `<PREFIX>_USERNAME` (or `<PREFIX>_EMAIL`), `<PREFIX>_PASSWORD` and
//! `<PREFIX>_SECRET`. For API platforms `_SECRET` is the access token.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use unipfp::{Credentials, DEFAULT_SESSIONS_DIR, Lifecycle};
use unipfp_platforms::PlatformId;

use crate::error::{CliError, Result};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "unipfp.json";
pub const SESSIONS_DIR_ENV: &str = "UNIPFP_SESSIONS_DIR";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct FileConfig {
	pub sessions_dir: Option<PathBuf>,
	pub headless: Option<bool>,
	pub extension: Option<PathBuf>,
	pub credentials: HashMap<String, Credentials>,
}

impl FileConfig {
	/// Reads `explicit`, or `unipfp.json` in the working directory if it exists.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		let path = match explicit {
			Some(path) => path.to_path_buf(),
			None => PathBuf::from(DEFAULT_CONFIG_FILE),
		};

		let content = match fs::read_to_string(&path) {
			Ok(content) => content,
			Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => return Ok(Self::default()),
			Err(source) => return Err(CliError::ConfigRead { path, source }),
		};

		let config: FileConfig =
			serde_json::from_str(&content).map_err(|source| CliError::ConfigParse { path: path.clone(), source })?;
		if let Some(name) = config.credentials.keys().find(|name| name.parse::<PlatformId>().is_err()) {
			return Err(CliError::ConfigValue {
				path,
				message: format!("unknown platform '{name}' under credentials"),
			});
		}

		tracing::debug!(target = "unipfp", path = %path.display(), "loaded config file");
		Ok(config)
	}

	fn credentials_for(&self, id: PlatformId) -> Credentials {
		self.credentials
			.iter()
			.filter(|(name, _)| name.parse::<PlatformId>().ok() == Some(id))
			.map(|(_, creds)| creds.clone())
			.fold(Credentials::default(), Credentials::overlay)
	}
}

/// Environment lookup, injectable for tests.
pub trait Env {
	fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
pub struct ProcessEnv;

impl Env for ProcessEnv {
	fn var(&self, name: &str) -> Option<String> {
		std::env::var(name).ok().filter(|v| !v.is_empty())
	}
}

impl Env for HashMap<String, String> {
	fn var(&self, name: &str) -> Option<String> {
		self.get(name).filter(|v| !v.is_empty()).cloned()
	}
}

/// Flags that override the config file.
#[derive(Debug, Default)]
pub struct Overrides {
	pub sessions_dir: Option<PathBuf>,
	pub headless: bool,
	pub extension: Option<PathBuf>,
}

/// Resolved settings. Not `Debug`: it holds credential variables.
pub struct Settings {
	pub sessions_dir: PathBuf,
	pub headless: bool,
	pub extension: Option<PathBuf>,
	file: FileConfig,
	env: HashMap<String, String>,
}

impl Settings {
	pub fn resolve(file: FileConfig, env: &dyn Env, overrides: Overrides) -> Self {
		let sessions_dir = overrides
			.sessions_dir
			.or_else(|| env.var(SESSIONS_DIR_ENV).map(PathBuf::from))
			.or_else(|| file.sessions_dir.clone())
			.unwrap_or_else(|| PathBuf::from(DEFAULT_SESSIONS_DIR));

		// Snapshot the credential variables so lookups stay pure afterwards.
		let mut snapshot = HashMap::new();
		for id in PlatformId::ALL {
			for suffix in ["USERNAME", "EMAIL", "PASSWORD", "SECRET"] {
				let name = format!("{}_{suffix}", id.env_prefix());
				if let Some(value) = env.var(&name) {
					snapshot.insert(name, value);
				}
			}
		}

		Self {
			sessions_dir,
			headless: overrides.headless || file.headless.unwrap_or(false),
			extension: overrides.extension.or_else(|| file.extension.clone()),
			file,
			env: snapshot,
		}
	}

	/// Credentials for `id`: config file first, environment fields win.
	pub fn credentials(&self, id: PlatformId) -> Credentials {
		let prefix = id.env_prefix();
		let var = |suffix: &str| self.env.var(&format!("{prefix}_{suffix}"));

		let identifier = var("USERNAME").or_else(|| var("EMAIL"));
		let password = var("PASSWORD");
		let secret = var("SECRET");

		let from_env = match id.lifecycle() {
			Lifecycle::Session => Credentials {
				identifier,
				secret: password,
				totp_secret: secret,
			},
			Lifecycle::Token => Credentials {
				identifier,
				secret: secret.or(password),
				totp_secret: None,
			},
		};

		// Threads shares the Instagram account.
		let file = match id {
			PlatformId::Threads => self.file.credentials_for(PlatformId::Instagram).overlay(self.file.credentials_for(id)),
			_ => self.file.credentials_for(id),
		};
		file.overlay(from_env)
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	fn write_config(temp: &TempDir, json: &str) -> PathBuf {
		let path = temp.path().join("unipfp.json");
		fs::write(&path, json).unwrap();
		path
	}

	#[test]
	fn env_overrides_file_per_field() {
		let temp = TempDir::new().unwrap();
		let path = write_config(
			&temp,
			r#"{"credentials": {"github": {"identifier": "from-file", "secret": "file-pw", "totpSecret": "FILESECRET"}}}"#,
		);
		let file = FileConfig::load(Some(&path)).unwrap();
		let settings = Settings::resolve(file, &env(&[("GITHUB_PASSWORD", "env-pw")]), Overrides::default());

		let creds = settings.credentials(PlatformId::GitHub);
		assert_eq!(creds.identifier.as_deref(), Some("from-file"));
		assert_eq!(creds.secret.as_deref(), Some("env-pw"));
		assert_eq!(creds.totp_secret.as_deref(), Some("FILESECRET"));
	}

	#[test]
	fn email_stands_in_for_username() {
		let settings = Settings::resolve(
			FileConfig::default(),
			&env(&[("DISCORD_EMAIL", "me@example.com"), ("DISCORD_PASSWORD", "pw"), ("DISCORD_SECRET", "JBSWY3DP")]),
			Overrides::default(),
		);

		let creds = settings.credentials(PlatformId::Discord);
		assert_eq!(creds.require_login("Discord").unwrap(), ("me@example.com", "pw"));
		assert_eq!(creds.totp_secret.as_deref(), Some("JBSWY3DP"));
	}

	#[test]
	fn gitlab_secret_is_the_access_token() {
		let settings = Settings::resolve(
			FileConfig::default(),
			&env(&[("GITLAB_SECRET", "glpat-token")]),
			Overrides::default(),
		);

		let creds = settings.credentials(PlatformId::GitLab);
		assert_eq!(creds.require_secret("GitLab").unwrap(), "glpat-token");
		assert!(creds.totp_secret.is_none());
	}

	#[test]
	fn threads_uses_instagram_variables() {
		let settings = Settings::resolve(
			FileConfig::default(),
			&env(&[("INSTAGRAM_USERNAME", "sunset.pics"), ("INSTAGRAM_PASSWORD", "pw")]),
			Overrides::default(),
		);

		assert_eq!(
			settings.credentials(PlatformId::Threads).require_login("Instagram").unwrap(),
			("sunset.pics", "pw")
		);
	}

	#[test]
	fn blank_threads_entry_keeps_instagram_login() {
		let temp = TempDir::new().unwrap();
		let path = write_config(
			&temp,
			r#"{"credentials": {"instagram": {"identifier": "sunset.pics", "secret": "real-pw"}, "threads": {"identifier": "", "secret": ""}}}"#,
		);
		let settings = Settings::resolve(FileConfig::load(Some(&path)).unwrap(), &env(&[]), Overrides::default());

		assert_eq!(
			settings.credentials(PlatformId::Threads).require_login("Instagram").unwrap(),
			("sunset.pics", "real-pw")
		);
	}

	#[test]
	fn sessions_dir_precedence() {
		let file = FileConfig {
			sessions_dir: Some("from-file".into()),
			..FileConfig::default()
		};
		let settings = Settings::resolve(file, &env(&[(SESSIONS_DIR_ENV, "from-env")]), Overrides::default());
		assert_eq!(settings.sessions_dir, PathBuf::from("from-env"));

		let settings = Settings::resolve(
			FileConfig::default(),
			&env(&[(SESSIONS_DIR_ENV, "from-env")]),
			Overrides {
				sessions_dir: Some("from-flag".into()),
				..Overrides::default()
			},
		);
		assert_eq!(settings.sessions_dir, PathBuf::from("from-flag"));

		let settings = Settings::resolve(FileConfig::default(), &env(&[]), Overrides::default());
		assert_eq!(settings.sessions_dir, PathBuf::from(DEFAULT_SESSIONS_DIR));
	}

	#[test]
	fn headless_flag_or_file() {
		let file = FileConfig {
			headless: Some(true),
			..FileConfig::default()
		};
		assert!(Settings::resolve(file, &env(&[]), Overrides::default()).headless);
		assert!(!Settings::resolve(FileConfig::default(), &env(&[]), Overrides::default()).headless);
	}

	#[test]
	fn unknown_platform_in_file_is_rejected() {
		let temp = TempDir::new().unwrap();
		let path = write_config(&temp, r#"{"credentials": {"myspace": {"identifier": "tom"}}}"#);
		let err = FileConfig::load(Some(&path)).unwrap_err();
		assert!(matches!(err, CliError::ConfigValue { .. }));
	}

	#[test]
	fn unknown_key_is_a_parse_error() {
		let temp = TempDir::new().unwrap();
		let path = write_config(&temp, r#"{"sessionDirectory": "x"}"#);
		assert!(matches!(FileConfig::load(Some(&path)), Err(CliError::ConfigParse { .. })));
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let temp = TempDir::new().unwrap();
		let err = FileConfig::load(Some(&temp.path().join("absent.json"))).unwrap_err();
		assert!(matches!(err, CliError::ConfigRead { .. }));
	}
}
