use std::fmt;

use serde::{Deserialize, Serialize};

/// The logical user whose credential and data are being accessed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Identity {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for Identity {
	fn from(id: String) -> Self {
		Self(id)
	}
}

fn default_token_type() -> String {
	"Bearer".to_string()
}

/// Token material proving an [`Identity`] to the remote API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	pub access_token: String,
	#[serde(default = "default_token_type")]
	pub token_type: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}

impl Credential {
	pub fn bearer(access_token: impl Into<String>) -> Self {
		Self {
			access_token: access_token.into(),
			token_type: default_token_type(),
			refresh_token: None,
		}
	}

	#[must_use]
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(refresh_token.into());
		self
	}

	pub(crate) fn authorization(&self) -> String {
		format!("{} {}", self.token_type, self.access_token)
	}
}

// Token material must never end up in logs
impl fmt::Debug for Credential {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field(
				"refresh_token",
				&self.refresh_token.as_ref().map(|_| "<redacted>"),
			)
			.finish()
	}
}
