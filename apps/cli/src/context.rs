use crate::config::CliConfig;

use nb_cloud_api::CloudApi;
use nb_cloud_client::SessionManager;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
	Human,
	Json,
}

/// Everything a command needs to run
pub struct Context {
	pub api: CloudApi,
	pub config: CliConfig,
	pub format: OutputFormat,
	pub data_dir: PathBuf,
}

impl Context {
	pub fn session(&self) -> &Arc<SessionManager> {
		self.api.session()
	}

	/// Prints `value` as JSON, or through `human` for the human format
	pub fn emit<T: Serialize + ?Sized>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
		match self.format {
			OutputFormat::Human => human(value),
			OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
		}

		Ok(())
	}
}

/// `1536` becomes `1.5 KiB`
pub fn format_bytes(bytes: u64) -> String {
	const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

	let mut unit = 0;
	#[allow(clippy::cast_precision_loss)]
	let mut value = bytes as f64;
	while value >= 1024.0 && unit < UNITS.len() - 1 {
		value /= 1024.0;
		unit += 1;
	}

	if unit == 0 {
		format!("{bytes} B")
	} else {
		format!("{value:.1} {}", UNITS[unit])
	}
}
