mod platforms;
mod sessions;
mod update;

use std::path::Path;

use crate::cli::{Cli, Commands};
use crate::config::{FileConfig, Overrides, ProcessEnv, Settings};
use crate::error::Result;

pub async fn dispatch(cli: Cli) -> Result<()> {
	match cli.command {
		Commands::Platforms => platforms::run(cli.format),
		Commands::Sessions { action } => {
			let overrides = Overrides {
				sessions_dir: cli.sessions_dir,
				..Overrides::default()
			};
			let settings = load_settings(cli.config.as_deref(), overrides)?;
			sessions::run(action, &settings, cli.format)
		}
		Commands::Update(args) => {
			let overrides = Overrides {
				sessions_dir: cli.sessions_dir,
				headless: args.headless,
				extension: args.extension.clone(),
			};
			let settings = load_settings(cli.config.as_deref(), overrides)?;
			update::run(args, settings, cli.format).await
		}
	}
}

fn load_settings(config: Option<&Path>, overrides: Overrides) -> Result<Settings> {
	let file = FileConfig::load(config)?;
	Ok(Settings::resolve(file, &ProcessEnv, overrides))
}
