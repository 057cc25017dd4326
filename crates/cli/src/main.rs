use clap::Parser;
use tracing::error;
use unipfp_cli::{cli::Cli, commands, logging};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "unipfp", error = %err, "command failed");
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}
