use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use unipfp_platforms::PlatformId;

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "unipfp")]
#[command(about = "Update your profile picture on every site at once")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Configuration file (defaults to ./unipfp.json when present)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Directory holding saved sessions
	#[arg(long, global = true, value_name = "DIR")]
	pub sessions_dir: Option<PathBuf>,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Update the profile picture on the selected platforms
	Update(UpdateArgs),

	/// List supported platforms
	#[command(alias = "ls")]
	Platforms,

	/// Inspect or remove saved sessions
	Sessions {
		#[command(subcommand)]
		action: SessionsAction,
	},
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
	/// New profile picture (.jpg, .jpeg, .png or .gif)
	pub image: PathBuf,

	/// Platform to update; repeat or separate with commas
	#[arg(short, long = "platform", value_name = "NAME", value_delimiter = ',', required = true)]
	pub platforms: Vec<PlatformId>,

	/// Run Chromium without a window
	#[arg(long)]
	pub headless: bool,

	/// Unpacked Chromium extension to load
	#[arg(long, value_name = "DIR")]
	pub extension: Option<PathBuf>,

	/// Skip the confirmation prompt
	#[arg(short, long)]
	pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum SessionsAction {
	/// List saved sessions
	#[command(alias = "ls")]
	List,

	/// Show the cookies of one saved session
	Show { platform: PlatformId },

	/// Delete saved sessions
	#[command(alias = "rm")]
	Clear {
		/// Platforms whose session should be removed
		#[arg(required_unless_present = "all", conflicts_with = "all")]
		platforms: Vec<PlatformId>,

		/// Remove every saved session
		#[arg(long)]
		all: bool,
	},
}

impl UpdateArgs {
	/// Selected platforms without duplicates, in first-seen order.
	pub fn selected(&self) -> Vec<PlatformId> {
		let mut selected = Vec::with_capacity(self.platforms.len());
		for id in &self.platforms {
			if !selected.contains(id) {
				selected.push(*id);
			}
		}
		selected
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn command_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn platforms_accept_commas_aliases_and_repeats() {
		let cli = Cli::try_parse_from([
			"unipfp", "update", "me.png", "-p", "github,x", "--platform", "GitHub", "-p", "reddit",
		])
		.unwrap();

		let Commands::Update(args) = cli.command else {
			panic!("expected update");
		};
		assert_eq!(args.selected(), [PlatformId::GitHub, PlatformId::TwitterX, PlatformId::Reddit]);
	}

	#[test]
	fn unknown_platform_is_rejected_by_parser() {
		let err = Cli::try_parse_from(["unipfp", "update", "me.png", "-p", "myspace"]).unwrap_err();
		assert!(err.to_string().contains("unknown platform 'myspace'"));
	}

	#[test]
	fn clear_needs_platforms_or_all() {
		assert!(Cli::try_parse_from(["unipfp", "sessions", "clear"]).is_err());
		assert!(Cli::try_parse_from(["unipfp", "sessions", "clear", "--all"]).is_ok());
		assert!(Cli::try_parse_from(["unipfp", "sessions", "clear", "steam", "--all"]).is_err());
	}

	#[test]
	fn format_is_global() {
		let cli = Cli::try_parse_from(["unipfp", "platforms", "--format", "json"]).unwrap();
		assert_eq!(cli.format, OutputFormat::Json);
	}
}
