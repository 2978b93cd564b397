//! Tracing subscriber setup for the `slogin` binary.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs a stderr subscriber. `RUST_LOG` overrides the verbosity flag.
pub fn init_logging(verbosity: u8) {
	let default = match verbosity {
		0 => "warn,slogin=info",
		1 => "info,slogin=debug",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).without_time().try_init();
}
