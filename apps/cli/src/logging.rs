use std::path::Path;

use anyhow::Result;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
	filter::LevelFilter,
	fmt::{self, Layer},
	prelude::*,
	EnvFilter,
};

const DEFAULT_DIRECTIVES: &str = "warn,nb_cli=info";

/// Console logging on stderr plus a daily rolling file in `<data_dir>/logs`.
///
/// `RUST_LOG` overrides the console filter, the file always records debug and up. The returned
/// guard flushes the file writer on drop, keep it alive for the whole run.
pub fn init(data_dir: &Path) -> Result<WorkerGuard> {
	let (non_blocking, guard) =
		tracing_appender::non_blocking(rolling::daily(data_dir.join("logs"), "nimbus.log"));

	let console_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(DEFAULT_DIRECTIVES))?;

	tracing_subscriber::registry()
		.with(
			fmt::layer()
				.with_writer(std::io::stderr)
				.with_filter(console_filter),
		)
		.with(
			Layer::default()
				.with_writer(non_blocking)
				.with_ansi(false)
				.with_filter(LevelFilter::DEBUG),
		)
		.try_init()?;

	Ok(guard)
}
