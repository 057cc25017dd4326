use colored::Colorize;
use serde::Serialize;
use unipfp::Credentials;
use unipfp_platforms::PlatformId;

use crate::error::Result;
use crate::output::{OutputFormat, print_json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformInfo {
	key: PlatformId,
	name: &'static str,
	via: &'static str,
	env_prefix: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	warning: Option<&'static str>,
}

fn catalog() -> Vec<PlatformInfo> {
	PlatformId::ALL
		.into_iter()
		.map(|id| PlatformInfo {
			key: id,
			name: id.display_name(),
			via: id.hint(),
			env_prefix: id.env_prefix(),
			warning: id.build(Credentials::default()).warning(),
		})
		.collect()
}

pub fn run(format: OutputFormat) -> Result<()> {
	let catalog = catalog();
	match format {
		OutputFormat::Json => print_json(&catalog),
		OutputFormat::Text => {
			for info in &catalog {
				println!(
					"{:<10} {:<11} {:<12} {}",
					info.key.to_string().bold(),
					info.name,
					info.via.dimmed(),
					format!("{}_*", info.env_prefix).dimmed()
				);
			}
		}
	}
	Ok(())
}
