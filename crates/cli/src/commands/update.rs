use std::io;

use unipfp::{
	Adapter, Capability, ImageFile, LaunchConfig, Lifecycle, Orchestrator, PlaywrightCapability, RunCoordinator,
	SessionStore,
};

use crate::cli::UpdateArgs;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ProgressReport, print_outcome, print_warning};
use crate::prompt::confirm;

pub async fn run(args: UpdateArgs, settings: Settings, format: OutputFormat) -> Result<()> {
	// A bad image path fails the whole run before anything is launched.
	let image = ImageFile::open(&args.image)?;

	let selected = args.selected();
	let adapters: Vec<Adapter> = selected.iter().map(|id| id.build(settings.credentials(*id))).collect();
	tracing::info!(
		target = "unipfp",
		platforms = ?selected.iter().map(|id| id.key()).collect::<Vec<_>>(),
		image = %image.path().display(),
		"starting update"
	);

	for adapter in &adapters {
		if let Some(warning) = adapter.warning() {
			print_warning(warning);
		}
	}

	if !args.yes && !confirm("Proceed?", &mut io::stdin().lock(), &mut io::stderr())? {
		eprintln!("Mission cancelled.");
		return Ok(());
	}

	let capability = if adapters.iter().any(|a| a.lifecycle() == Lifecycle::Session) {
		let config = LaunchConfig {
			headless: settings.headless,
			extension: settings.extension.clone(),
			driver: None,
		};
		Some(PlaywrightCapability::launch(config).await.map_err(CliError::Launch)?)
	} else {
		None
	};

	let mut coordinator = RunCoordinator::new(Orchestrator::new(SessionStore::new(settings.sessions_dir.clone())));
	if format == OutputFormat::Text {
		coordinator = coordinator.with_observer(ProgressReport);
	}

	let outcome = coordinator
		.run(capability.as_ref().map(|c| c as &dyn Capability), &adapters, &image)
		.await;

	if let Some(capability) = &capability {
		if let Err(err) = capability.close().await {
			tracing::warn!(target = "unipfp", error = %err, "failed to close browser");
		}
	}

	print_outcome(&outcome, format);
	Ok(())
}
