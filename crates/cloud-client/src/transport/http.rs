use super::{
	HttpRequest, HttpResponse, Method, Transport, TransportFactory, TransportFailure,
	TransportOptions, TransportOutcome,
};
use crate::error::TransportBuildError;

use std::{error::Error as StdError, sync::Arc};

use async_trait::async_trait;
use tracing::trace;

/// Production transport, a thin wrapper over a pooled [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	pub fn new(options: &TransportOptions) -> Result<Self, TransportBuildError> {
		reqwest::Client::builder()
			.user_agent(options.user_agent.as_str())
			.connect_timeout(options.connect_timeout)
			.build()
			.map(|client| Self { client })
			.map_err(|e| TransportBuildError(e.to_string()))
	}
}

impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Patch => Self::PATCH,
			Method::Delete => Self::DELETE,
		}
	}
}

#[async_trait]
impl Transport for ReqwestTransport {
	async fn execute(&self, request: HttpRequest) -> TransportOutcome {
		let HttpRequest {
			method,
			url,
			headers,
			body,
			timeout,
		} = request;

		let mut builder = self
			.client
			.request(method.into(), url.as_str())
			.timeout(timeout);

		for (name, value) in headers {
			builder = builder.header(name, value);
		}

		if let Some(body) = body {
			builder = builder.body(body);
		}

		let response = builder.send().await.map_err(failure_from)?;
		let status = response.status().as_u16();
		let body = response.bytes().await.map_err(failure_from)?;

		trace!(%status, len = body.len(), "received response");

		Ok(HttpResponse {
			status,
			body: body.to_vec(),
		})
	}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransportFactory;

impl TransportFactory for ReqwestTransportFactory {
	fn build(&self, options: &TransportOptions) -> Result<Arc<dyn Transport>, TransportBuildError> {
		Ok(Arc::new(ReqwestTransport::new(options)?))
	}
}

fn failure_from(e: reqwest::Error) -> TransportFailure {
	if e.is_timeout() {
		TransportFailure::Timeout
	} else if mentions_tls(&e) {
		TransportFailure::Tls(e.to_string())
	} else if e.is_connect() {
		TransportFailure::NoRoute
	} else {
		TransportFailure::Io(e.to_string())
	}
}

/// reqwest has no dedicated TLS predicate, so we look for it along the source chain
fn mentions_tls(e: &(dyn StdError + 'static)) -> bool {
	let mut current = Some(e);

	while let Some(err) = current {
		let message = err.to_string().to_ascii_lowercase();
		if ["certificate", "tls", "handshake"]
			.iter()
			.any(|needle| message.contains(needle))
		{
			return true;
		}
		current = err.source();
	}

	false
}

#[cfg(test)]
mod tests {
	use super::*;

	use std::{fmt, io};

	#[derive(Debug)]
	struct Wrapper(io::Error);

	impl fmt::Display for Wrapper {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str("error trying to connect")
		}
	}

	impl StdError for Wrapper {
		fn source(&self) -> Option<&(dyn StdError + 'static)> {
			Some(&self.0)
		}
	}

	#[test]
	fn tls_is_found_deep_in_the_source_chain() {
		let err = Wrapper(io::Error::new(
			io::ErrorKind::InvalidData,
			"invalid peer certificate: UnknownIssuer",
		));
		assert!(mentions_tls(&err));

		let err = Wrapper(io::Error::new(
			io::ErrorKind::ConnectionRefused,
			"Connection refused (os error 111)",
		));
		assert!(!mentions_tls(&err));
	}

	#[test]
	fn methods_map_onto_reqwest() {
		assert_eq!(reqwest::Method::from(Method::Patch), reqwest::Method::PATCH);
		assert_eq!(Method::Delete.to_string(), "DELETE");
	}
}
