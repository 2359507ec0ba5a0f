use crate::transport::TransportOptions;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the remote API lives and how patient we are with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
	/// Base URL every endpoint path is appended to, without a trailing slash
	pub api_url: String,
	pub request_timeout_secs: u64,
	pub connect_timeout_secs: u64,
	pub user_agent: String,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			api_url: "http://localhost:8080/api/v1".to_string(),
			request_timeout_secs: 30,
			connect_timeout_secs: 10,
			user_agent: concat!("nimbus/", env!("CARGO_PKG_VERSION")).to_string(),
		}
	}
}

impl ClientConfig {
	pub fn with_api_url(api_url: impl Into<String>) -> Self {
		Self {
			api_url: api_url.into(),
			..Default::default()
		}
	}

	/// Joins `path` onto the base URL, tolerating stray slashes on either side
	#[must_use]
	pub fn endpoint(&self, path: &str) -> String {
		format!(
			"{}/{}",
			self.api_url.trim_end_matches('/'),
			path.trim_start_matches('/')
		)
	}

	#[must_use]
	pub const fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}

	#[must_use]
	pub fn transport_options(&self, allow_metered: bool) -> TransportOptions {
		TransportOptions {
			allow_metered,
			connect_timeout: Duration::from_secs(self.connect_timeout_secs),
			user_agent: self.user_agent.clone(),
		}
	}
}
