//! Concrete adapters for every supported site and the [`PlatformId`] registry
//! that maps user-facing names onto them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use unipfp::{Adapter, Credentials, Lifecycle};

pub mod adapters;
mod support;

pub use adapters::{Discord, GitHub, GitLab, Instagram, Plex, Reddit, Steam, Threads, Twitch, TwitterX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
	Discord,
	GitHub,
	GitLab,
	Instagram,
	Plex,
	Reddit,
	Steam,
	Threads,
	Twitch,
	TwitterX,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown platform '{0}' (expected one of: {names})", names = PlatformId::key_list())]
pub struct UnknownPlatform(pub String);

impl PlatformId {
	pub const ALL: [PlatformId; 10] = [
		PlatformId::Discord,
		PlatformId::GitHub,
		PlatformId::GitLab,
		PlatformId::Instagram,
		PlatformId::Plex,
		PlatformId::Reddit,
		PlatformId::Steam,
		PlatformId::Threads,
		PlatformId::Twitch,
		PlatformId::TwitterX,
	];

	/// Stable lowercase key, also the session file name.
	pub fn key(self) -> &'static str {
		match self {
			PlatformId::Discord => "discord",
			PlatformId::GitHub => "github",
			PlatformId::GitLab => "gitlab",
			PlatformId::Instagram => "instagram",
			PlatformId::Plex => "plex",
			PlatformId::Reddit => "reddit",
			PlatformId::Steam => "steam",
			PlatformId::Threads => "threads",
			PlatformId::Twitch => "twitch",
			PlatformId::TwitterX => "twitterx",
		}
	}

	pub fn display_name(self) -> &'static str {
		match self {
			PlatformId::Discord => "Discord",
			PlatformId::GitHub => "GitHub",
			PlatformId::GitLab => "GitLab",
			PlatformId::Instagram => "Instagram",
			PlatformId::Plex => "Plex",
			PlatformId::Reddit => "Reddit",
			PlatformId::Steam => "Steam",
			PlatformId::Threads => "Threads",
			PlatformId::Twitch => "Twitch",
			PlatformId::TwitterX => "Twitter(X)",
		}
	}

	/// Environment variable prefix holding this platform's credentials.
	/// Threads signs in with the Instagram account.
	pub fn env_prefix(self) -> &'static str {
		match self {
			PlatformId::Discord => "DISCORD",
			PlatformId::GitHub => "GITHUB",
			PlatformId::GitLab => "GITLAB",
			PlatformId::Instagram | PlatformId::Threads => "INSTAGRAM",
			PlatformId::Plex => "PLEX",
			PlatformId::Reddit => "REDDIT",
			PlatformId::Steam => "STEAM",
			PlatformId::Twitch => "TWITCH",
			PlatformId::TwitterX => "TWITTERX",
		}
	}

	pub fn lifecycle(self) -> Lifecycle {
		match self {
			PlatformId::GitLab => Lifecycle::Token,
			_ => Lifecycle::Session,
		}
	}

	/// Short hint shown next to the name in listings.
	pub fn hint(self) -> &'static str {
		match self.lifecycle() {
			Lifecycle::Session => "via browser",
			Lifecycle::Token => "via API",
		}
	}

	/// Builds the adapter, handing it its credentials.
	pub fn build(self, credentials: Credentials) -> Adapter {
		match self {
			PlatformId::Discord => Adapter::Browser(Box::new(Discord::new(credentials))),
			PlatformId::GitHub => Adapter::Browser(Box::new(GitHub::new(credentials))),
			PlatformId::GitLab => Adapter::Api(Box::new(GitLab::new(credentials))),
			PlatformId::Instagram => Adapter::Browser(Box::new(Instagram::new(credentials))),
			PlatformId::Plex => Adapter::Browser(Box::new(Plex::new(credentials))),
			PlatformId::Reddit => Adapter::Browser(Box::new(Reddit::new(credentials))),
			PlatformId::Steam => Adapter::Browser(Box::new(Steam::new(credentials))),
			PlatformId::Threads => Adapter::Browser(Box::new(Threads::new(credentials))),
			PlatformId::Twitch => Adapter::Browser(Box::new(Twitch::new(credentials))),
			PlatformId::TwitterX => Adapter::Browser(Box::new(TwitterX::new(credentials))),
		}
	}

	fn key_list() -> String {
		Self::ALL.iter().map(|id| id.key()).collect::<Vec<_>>().join(", ")
	}
}

impl fmt::Display for PlatformId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

impl FromStr for PlatformId {
	type Err = UnknownPlatform;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let name = s.trim().to_ascii_lowercase();
		match name.as_str() {
			"twitter" | "x" | "twitter(x)" => return Ok(PlatformId::TwitterX),
			_ => {}
		}
		Self::ALL
			.into_iter()
			.find(|id| id.key() == name)
			.ok_or_else(|| UnknownPlatform(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_keys_and_aliases() {
		assert_eq!("github".parse::<PlatformId>().unwrap(), PlatformId::GitHub);
		assert_eq!(" Reddit ".parse::<PlatformId>().unwrap(), PlatformId::Reddit);
		for alias in ["twitter", "X", "Twitter(X)", "twitterx"] {
			assert_eq!(alias.parse::<PlatformId>().unwrap(), PlatformId::TwitterX);
		}
	}

	#[test]
	fn unknown_name_lists_choices() {
		let err = "myspace".parse::<PlatformId>().unwrap_err();
		assert_eq!(err, UnknownPlatform("myspace".into()));
		assert!(err.to_string().contains("discord, github, gitlab"));
	}

	#[test]
	fn keys_round_trip_through_display() {
		for id in PlatformId::ALL {
			assert_eq!(id.to_string().parse::<PlatformId>().unwrap(), id);
		}
	}

	#[test]
	fn threads_reads_instagram_environment() {
		assert_eq!(PlatformId::Threads.env_prefix(), "INSTAGRAM");
		assert_eq!(PlatformId::TwitterX.env_prefix(), "TWITTERX");
	}

	#[test]
	fn built_adapters_match_registry() {
		for id in PlatformId::ALL {
			let adapter = id.build(Credentials::default());
			assert_eq!(adapter.name(), id.display_name());
			assert_eq!(adapter.lifecycle(), id.lifecycle());
		}
	}

	#[test]
	fn browser_adapters_use_key_as_session_file() {
		for id in PlatformId::ALL {
			if let Adapter::Browser(adapter) = id.build(Credentials::default()) {
				assert_eq!(adapter.descriptor().session_key, id.key());
			}
		}
	}

	#[test]
	fn only_gitlab_goes_through_the_api() {
		let api: Vec<_> = PlatformId::ALL.into_iter().filter(|id| id.lifecycle() == Lifecycle::Token).collect();
		assert_eq!(api, [PlatformId::GitLab]);
		assert_eq!(PlatformId::GitLab.hint(), "via API");
	}
}
