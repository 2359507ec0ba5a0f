//! CLI-specific configuration management

use nb_cloud_client::{ClientConfig, Identity};

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// CLI configuration stored in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
	/// Where the API lives and how long to wait for it
	pub client: ClientConfig,
	/// Identity to resume on the next run
	pub last_identity: Option<Identity>,
	/// Whether metered networks may be used
	pub allow_metered: bool,
}

impl CliConfig {
	/// Get the CLI config file path
	pub fn config_path(data_dir: &Path) -> PathBuf {
		data_dir.join("cli.json")
	}

	/// Load CLI config from the data directory, creating a default one on first run
	pub fn load(data_dir: &Path) -> Result<Self> {
		let config_path = Self::config_path(data_dir);

		if config_path.exists() {
			let json = std::fs::read_to_string(&config_path)
				.with_context(|| format!("Failed to read {}", config_path.display()))?;
			serde_json::from_str(&json)
				.with_context(|| format!("Malformed config at {}", config_path.display()))
		} else {
			let config = Self::default();
			config.save(data_dir)?;
			Ok(config)
		}
	}

	/// Save CLI config to the data directory
	pub fn save(&self, data_dir: &Path) -> Result<()> {
		std::fs::create_dir_all(data_dir)
			.with_context(|| format!("Failed to create {}", data_dir.display()))?;

		let config_path = Self::config_path(data_dir);
		let json = serde_json::to_string_pretty(self)?;
		std::fs::write(&config_path, json)
			.with_context(|| format!("Failed to write {}", config_path.display()))
	}

	pub fn set_last_identity(&mut self, identity: Option<Identity>, data_dir: &Path) -> Result<()> {
		self.last_identity = identity;
		self.save(data_dir)
	}

	pub fn set_allow_metered(&mut self, allowed: bool, data_dir: &Path) -> Result<()> {
		self.allow_metered = allowed;
		self.save(data_dir)
	}
}
