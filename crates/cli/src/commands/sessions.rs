use std::time::{SystemTime, UNIX_EPOCH};

use colored::Colorize;
use serde::Serialize;
use unipfp::{SessionStore, StorageState, StoredSession};
use unipfp_platforms::PlatformId;

use crate::cli::SessionsAction;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, print_json};

/// Cookie metadata shown by `sessions show`. Values are never printed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CookieSummary<'a> {
	name: &'a str,
	domain: Option<&'a str>,
	expires: Option<f64>,
	expired: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDetail<'a> {
	platform: PlatformId,
	cookies: Vec<CookieSummary<'a>>,
	origins: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct Cleared {
	cleared: Vec<String>,
}

fn now() -> f64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs_f64())
		.unwrap_or_default()
}

/// Human description of a cookie expiry relative to `now`.
fn describe_expiry(expiry: Option<f64>, now: f64) -> String {
	match expiry {
		None => "session cookies only".to_string(),
		Some(at) if at <= now => "expired".to_string(),
		Some(at) => {
			let hours = ((at - now) / 3600.0).floor() as u64;
			if hours >= 48 {
				format!("expires in {} days", hours / 24)
			} else {
				format!("expires in {hours} hours")
			}
		}
	}
}

pub fn run(action: SessionsAction, settings: &Settings, format: OutputFormat) -> Result<()> {
	let store = SessionStore::new(settings.sessions_dir.clone());
	match action {
		SessionsAction::List => list(&store, format),
		SessionsAction::Show { platform } => show(&store, platform, format),
		SessionsAction::Clear { platforms, all } => clear(&store, &platforms, all, format),
	}
}

fn list(store: &SessionStore, format: OutputFormat) -> Result<()> {
	let sessions = store.list()?;
	match format {
		OutputFormat::Json => print_json(&sessions),
		OutputFormat::Text if sessions.is_empty() => {
			println!("No saved sessions in {}", store.dir().display());
		}
		OutputFormat::Text => {
			let now = now();
			for session in &sessions {
				println!("{}", list_line(session, now));
			}
		}
	}
	Ok(())
}

fn list_line(session: &StoredSession, now: f64) -> String {
	match session.cookies {
		Some(count) => format!(
			"{:<10} {:>3} cookies  {}",
			session.key.bold(),
			count,
			describe_expiry(session.earliest_expiry, now)
		),
		None => format!("{:<10} {}", session.key.bold(), "unreadable".red()),
	}
}

fn show(store: &SessionStore, platform: PlatformId, format: OutputFormat) -> Result<()> {
	let Some(state) = store.load(platform.key())? else {
		return Err(CliError::NoSession(platform.display_name()));
	};
	let detail = detail(platform, &state, now());

	match format {
		OutputFormat::Json => print_json(&detail),
		OutputFormat::Text => {
			println!("{} ({})", platform.display_name().bold(), store.path_for(platform.key()).display());
			for cookie in &detail.cookies {
				let status = if cookie.expired { "expired".red() } else { "valid".green() };
				println!("  {:<32} {:<28} {}", cookie.name, cookie.domain.unwrap_or("-"), status);
			}
			for origin in &detail.origins {
				println!("  {} {origin}", "localStorage".dimmed());
			}
		}
	}
	Ok(())
}

fn detail(platform: PlatformId, state: &StorageState, now: f64) -> SessionDetail<'_> {
	SessionDetail {
		platform,
		cookies: state
			.cookies
			.iter()
			.map(|c| CookieSummary {
				name: &c.name,
				domain: c.domain.as_deref(),
				expires: c.expires,
				expired: c.is_expired_at(now),
			})
			.collect(),
		origins: state.origins.iter().map(|o| o.origin.as_str()).collect(),
	}
}

fn clear(store: &SessionStore, platforms: &[PlatformId], all: bool, format: OutputFormat) -> Result<()> {
	let keys: Vec<String> = if all {
		store.list()?.into_iter().map(|s| s.key).collect()
	} else {
		platforms.iter().map(|p| p.key().to_string()).collect()
	};

	let mut cleared = Vec::new();
	for key in keys {
		if store.clear(&key)? {
			tracing::info!(target = "unipfp.session", session_key = key.as_str(), "session cleared");
			cleared.push(key);
		} else if format == OutputFormat::Text {
			println!("No saved session for {key}");
		}
	}

	match format {
		OutputFormat::Json => print_json(&Cleared { cleared }),
		OutputFormat::Text => {
			for key in &cleared {
				println!("{} {key}", "Removed".green());
			}
		}
	}
	Ok(())
}
