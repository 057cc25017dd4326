use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count. `RUST_LOG` wins when set.
pub fn default_directive(verbose: u8) -> &'static str {
	match verbose {
		0 => "unipfp=warn,warn",
		1 => "unipfp=info,warn",
		2 => "unipfp=debug,info",
		_ => "trace",
	}
}

pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose >= 2)
		.with_line_number(verbose >= 3)
		.try_init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn directives_parse() {
		for verbose in 0..4 {
			assert!(default_directive(verbose).parse::<EnvFilter>().is_ok());
		}
	}
}
