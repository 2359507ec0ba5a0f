use crate::{
	transport::{HttpRequest, HttpResponse, Method},
	ClientConfig, ClientError, Credential,
};

use std::fmt::Write as _;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::error;

const JSON: &str = "application/json";
const OCTET_STREAM: &str = "application/octet-stream";

/// One logical call against the remote API, consumed by
/// [`RequestDispatcher::send`](crate::RequestDispatcher::send)
#[derive(Debug, Clone)]
pub struct ApiRequest {
	pub(crate) method: Method,
	pub(crate) path: String,
	pub(crate) query: Vec<(String, String)>,
	pub(crate) body: Option<Vec<u8>>,
	pub(crate) content_type: Option<&'static str>,
	pub(crate) attach_credential: bool,
	pub(crate) cancel: CancellationToken,
}

impl ApiRequest {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
			content_type: None,
			attach_credential: true,
			cancel: CancellationToken::new(),
		}
	}

	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::Patch, path)
	}

	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Sends the request without the active credential, for endpoints like login
	#[must_use]
	pub fn anonymous(mut self) -> Self {
		self.attach_credential = false;
		self
	}

	#[must_use]
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));
		self
	}

	#[must_use]
	pub fn json(mut self, body: &Value) -> Self {
		self.body = Some(body.to_string().into_bytes());
		self.content_type = Some(JSON);
		self
	}

	#[must_use]
	pub fn bytes(mut self, body: Vec<u8>) -> Self {
		self.body = Some(body);
		self.content_type = Some(OCTET_STREAM);
		self
	}

	/// Ties the request to `parent`: cancelling the parent cancels this request, but not the
	/// other way around
	#[must_use]
	pub fn cancel_with(mut self, parent: &CancellationToken) -> Self {
		self.cancel = parent.child_token();
		self
	}

	#[must_use]
	pub const fn cancellation(&self) -> &CancellationToken {
		&self.cancel
	}

	#[must_use]
	pub const fn method(&self) -> Method {
		self.method
	}

	#[must_use]
	pub fn path(&self) -> &str {
		&self.path
	}

	#[must_use]
	pub const fn attaches_credential(&self) -> bool {
		self.attach_credential
	}

	pub(crate) fn into_http(
		self,
		config: &ClientConfig,
		credential: Option<&Credential>,
	) -> HttpRequest {
		let mut url = config.endpoint(&self.path);
		for (i, (key, value)) in self.query.iter().enumerate() {
			let separator = if i == 0 { '?' } else { '&' };
			// Writing into a String cannot fail
			let _ = write!(
				url,
				"{separator}{}={}",
				urlencoding::encode(key),
				urlencoding::encode(value)
			);
		}

		let mut headers = vec![("Accept", JSON.to_string())];
		if let Some(content_type) = self.content_type {
			headers.push(("Content-Type", content_type.to_string()));
		}
		if let Some(credential) = credential {
			headers.push(("Authorization", credential.authorization()));
		}

		HttpRequest {
			method: self.method,
			url,
			headers,
			body: self.body,
			timeout: config.request_timeout(),
		}
	}
}

/// A successful (2xx) response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
	status: u16,
	body: Vec<u8>,
}

impl From<HttpResponse> for ApiResponse {
	fn from(HttpResponse { status, body }: HttpResponse) -> Self {
		Self { status, body }
	}
}

impl ApiResponse {
	#[must_use]
	pub const fn status(&self) -> u16 {
		self.status
	}

	#[must_use]
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	#[must_use]
	pub fn into_bytes(self) -> Vec<u8> {
		self.body
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.body.is_empty()
	}

	pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
		serde_json::from_slice(&self.body).map_err(|e| {
			error!(
				?e,
				target_type = std::any::type_name::<T>(),
				"Failed to decode response payload;"
			);
			ClientError::Decoded(e.to_string())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use serde::Deserialize;
	use serde_json::json;

	#[test]
	fn query_is_percent_encoded() {
		let request = ApiRequest::get("/search")
			.query("q", "tax report 2024/Q1")
			.query("limit", 20)
			.into_http(&ClientConfig::with_api_url("https://cloud.test"), None);

		assert_eq!(
			request.url,
			"https://cloud.test/search?q=tax%20report%202024%2FQ1&limit=20"
		);
		assert_eq!(request.header("authorization"), None);
		assert_eq!(request.header("accept"), Some(JSON));
	}

	#[test]
	fn credential_and_body_become_headers() {
		let request = ApiRequest::post("/nodes/n1/rename")
			.json(&json!({ "name": "Holiday" }))
			.into_http(
				&ClientConfig::default(),
				Some(&Credential::bearer("abc")),
			);

		assert_eq!(request.header("Authorization"), Some("Bearer abc"));
		assert_eq!(request.header("Content-Type"), Some(JSON));
		assert_eq!(request.body.as_deref(), Some(br#"{"name":"Holiday"}"#.as_slice()));
	}

	#[test]
	fn child_cancellation_does_not_reach_the_parent() {
		let scope = CancellationToken::new();
		let request = ApiRequest::get("/mounts").cancel_with(&scope);

		request.cancellation().cancel();
		assert!(!scope.is_cancelled());

		let sibling = ApiRequest::get("/mounts").cancel_with(&scope);
		scope.cancel();
		assert!(sibling.cancellation().is_cancelled());
	}

	#[test]
	fn undecodable_payload_is_a_decode_error() {
		#[derive(Debug, Deserialize)]
		struct Mount {
			#[allow(dead_code)]
			id: String,
		}

		let response = ApiResponse::from(HttpResponse {
			status: 200,
			body: br#"{"unexpected":true}"#.to_vec(),
		});

		assert!(matches!(
			response.json::<Mount>(),
			Err(ClientError::Decoded(_))
		));
	}
}
