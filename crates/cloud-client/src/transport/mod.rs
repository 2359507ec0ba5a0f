//! The seam between the dispatcher and whatever actually moves bytes.

use crate::error::TransportBuildError;

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

mod http;

pub use http::{ReqwestTransport, ReqwestTransportFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl Method {
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}

impl fmt::Display for Method {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A fully resolved request, ready to go on the wire
#[derive(Debug, Clone)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
	pub headers: Vec<(&'static str, String)>,
	pub body: Option<Vec<u8>>,
	pub timeout: Duration,
}

impl HttpRequest {
	/// Header lookup, case insensitive on the name
	#[must_use]
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(header, _)| header.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: Vec<u8>,
}

/// Why a transport attempt produced no HTTP response at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFailure {
	#[error("request deadline exceeded")]
	Timeout,
	#[error("no route to the server")]
	NoRoute,
	#[error("TLS failure: {0}")]
	Tls(String),
	#[error("I/O failure: {0}")]
	Io(String),
}

pub type TransportOutcome = Result<HttpResponse, TransportFailure>;

/// Performs exactly one HTTP exchange per call, never retrying on its own
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	async fn execute(&self, request: HttpRequest) -> TransportOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
	pub allow_metered: bool,
	pub connect_timeout: Duration,
	pub user_agent: String,
}

pub trait TransportFactory: Send + Sync + 'static {
	fn build(&self, options: &TransportOptions) -> Result<Arc<dyn Transport>, TransportBuildError>;

	/// Whether built transports pin themselves to network interfaces, in which case a change of
	/// the metered-network policy needs a fresh transport
	fn binds_interfaces(&self) -> bool {
		false
	}
}
