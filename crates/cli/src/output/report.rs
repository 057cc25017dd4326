use std::io::{self, Write};

use colored::Colorize;
use serde::Serialize;
use unipfp::{PlatformOutcome, RunObserver, RunOutcome};

use super::OutputFormat;

/// Live progress lines on stderr while a run is in flight.
#[derive(Debug, Default)]
pub struct ProgressReport;

impl RunObserver for ProgressReport {
	fn on_start(&self, index: usize, total: usize, platform: &str) {
		eprintln!("{} Updating pfp on {platform}...", format!("[{}/{total}]", index + 1).dimmed());
	}

	fn on_finish(&self, outcome: &PlatformOutcome) {
		eprintln!("{}", outcome_line(outcome));
	}
}

pub fn outcome_line(outcome: &PlatformOutcome) -> String {
	match &outcome.result {
		Ok(message) => format!("{} {}", "✔".green(), message),
		Err(err) => format!("{} {}: {}", "✖".red(), outcome.platform.bold(), err),
	}
}

/// Summary line printed after all adapters ran.
pub fn summary_line(outcome: &RunOutcome) -> String {
	let succeeded = outcome.succeeded().count();
	let failed = outcome.failed().count();
	if failed == 0 {
		format!("{} {succeeded} of {} updated", "Mission completed.".green().bold(), outcome.len())
	} else {
		format!(
			"{} {succeeded} updated, {failed} failed",
			"Mission completed with errors.".yellow().bold()
		)
	}
}

pub fn print_outcome(outcome: &RunOutcome, format: OutputFormat) {
	match format {
		OutputFormat::Text => println!("{}", summary_line(outcome)),
		OutputFormat::Json => print_json(outcome),
	}
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
	if let Ok(json) = serde_json::to_string_pretty(value) {
		let _ = writeln!(io::stdout().lock(), "{json}");
	}
}

pub fn print_warning(message: &str) {
	eprintln!("{} {message}", "warning:".yellow().bold());
}
