//! Scripted doubles for exercising the client without a network or a keychain.

use crate::{
	error::{TransportBuildError, VaultError},
	network::AssumeUnmetered,
	session::SessionManager,
	transport::{
		HttpRequest, HttpResponse, Transport, TransportFactory, TransportFailure,
		TransportOptions, TransportOutcome,
	},
	vault::{CredentialVault, MemoryVault},
	ClientConfig, Credential, Identity,
};

use std::{
	future,
	sync::{
		atomic::{AtomicBool, AtomicUsize, Ordering},
		Arc,
	},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

pub const TEST_API_URL: &str = "https://cloud.test/api";

/// What a [`MockTransport`] does with one request
#[derive(Debug)]
pub enum MockReply {
	Ready(TransportOutcome),
	/// Completes once the [`Notify`] fires
	Gated(Arc<Notify>, TransportOutcome),
	/// Never completes
	Pending,
}

impl MockReply {
	#[must_use]
	pub fn status(status: u16) -> Self {
		Self::Ready(Ok(HttpResponse {
			status,
			body: Vec::new(),
		}))
	}

	#[must_use]
	pub fn json(status: u16, body: &Value) -> Self {
		Self::Ready(Ok(HttpResponse {
			status,
			body: body.to_string().into_bytes(),
		}))
	}

	#[must_use]
	pub fn bytes(body: impl Into<Vec<u8>>) -> Self {
		Self::Ready(Ok(HttpResponse {
			status: 200,
			body: body.into(),
		}))
	}

	#[must_use]
	pub const fn failure(failure: TransportFailure) -> Self {
		Self::Ready(Err(failure))
	}
}

type Handler = dyn Fn(&HttpRequest) -> MockReply + Send + Sync;

/// A transport answering from a handler closure and recording everything it was asked
pub struct MockTransport {
	handler: Box<Handler>,
	requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
	pub fn new(handler: impl Fn(&HttpRequest) -> MockReply + Send + Sync + 'static) -> Arc<Self> {
		Arc::new(Self {
			handler: Box::new(handler),
			requests: Mutex::new(Vec::new()),
		})
	}

	/// Every request seen so far, in arrival order
	#[must_use]
	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().clone()
	}

	#[must_use]
	pub fn request_count(&self) -> usize {
		self.requests.lock().len()
	}

	/// Requests whose URL ends with `suffix`, query string excluded
	#[must_use]
	pub fn requests_to(&self, suffix: &str) -> Vec<HttpRequest> {
		self.requests
			.lock()
			.iter()
			.filter(|request| path_of(&request.url).ends_with(suffix))
			.cloned()
			.collect()
	}
}

/// The URL without its query string
#[must_use]
pub fn path_of(url: &str) -> &str {
	url.split_once('?').map_or(url, |(path, _)| path)
}

#[async_trait]
impl Transport for MockTransport {
	async fn execute(&self, request: HttpRequest) -> TransportOutcome {
		let reply = (self.handler)(&request);
		self.requests.lock().push(request);

		match reply {
			MockReply::Ready(outcome) => outcome,
			MockReply::Gated(gate, outcome) => {
				gate.notified().await;
				outcome
			}
			MockReply::Pending => future::pending().await,
		}
	}
}

/// Hands out the same [`MockTransport`] every time, counting how often it was asked to
pub struct MockTransportFactory {
	transport: Arc<MockTransport>,
	builds: AtomicUsize,
	binds_interfaces: bool,
	last_options: Mutex<Option<TransportOptions>>,
}

impl MockTransportFactory {
	#[must_use]
	pub fn new(transport: Arc<MockTransport>) -> Arc<Self> {
		Self::with_interface_binding(transport, false)
	}

	#[must_use]
	pub fn with_interface_binding(
		transport: Arc<MockTransport>,
		binds_interfaces: bool,
	) -> Arc<Self> {
		Arc::new(Self {
			transport,
			builds: AtomicUsize::new(0),
			binds_interfaces,
			last_options: Mutex::new(None),
		})
	}

	#[must_use]
	pub fn builds(&self) -> usize {
		self.builds.load(Ordering::SeqCst)
	}

	#[must_use]
	pub fn last_options(&self) -> Option<TransportOptions> {
		self.last_options.lock().clone()
	}
}

impl TransportFactory for MockTransportFactory {
	fn build(&self, options: &TransportOptions) -> Result<Arc<dyn Transport>, TransportBuildError> {
		self.builds.fetch_add(1, Ordering::SeqCst);
		*self.last_options.lock() = Some(options.clone());

		let transport: Arc<dyn Transport> = self.transport.clone();

		Ok(transport)
	}

	fn binds_interfaces(&self) -> bool {
		self.binds_interfaces
	}
}

/// A [`MemoryVault`] whose reads can be held open or made to fail
#[derive(Debug, Default)]
pub struct GatedVault {
	inner: MemoryVault,
	gate_reads: AtomicBool,
	fail_reads: AtomicBool,
	entered: Notify,
	release: Notify,
}

impl GatedVault {
	#[must_use]
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Makes every following read wait for [`GatedVault::release`]
	pub fn gate_reads(&self, gated: bool) {
		self.gate_reads.store(gated, Ordering::SeqCst);
	}

	pub fn fail_reads(&self, failing: bool) {
		self.fail_reads.store(failing, Ordering::SeqCst);
	}

	/// Resolves once a gated read has started
	pub async fn entered(&self) {
		self.entered.notified().await;
	}

	pub fn release(&self) {
		self.release.notify_one();
	}
}

#[async_trait]
impl CredentialVault for GatedVault {
	async fn save(&self, credential: &Credential, identity: &Identity) -> Result<(), VaultError> {
		self.inner.save(credential, identity).await
	}

	async fn read(&self, identity: &Identity) -> Result<Option<Credential>, VaultError> {
		if self.gate_reads.load(Ordering::SeqCst) {
			self.entered.notify_one();
			self.release.notified().await;
		}

		if self.fail_reads.load(Ordering::SeqCst) {
			return Err(VaultError::Backend("injected read failure".to_string()));
		}

		self.inner.read(identity).await
	}

	async fn delete(&self, identity: &Identity) -> Result<(), VaultError> {
		self.inner.delete(identity).await
	}

	async fn list_identities(&self) -> Result<Vec<Identity>, VaultError> {
		self.inner.list_identities().await
	}
}

/// A logged-out session manager talking to `transport` through [`TEST_API_URL`] on an unmetered
/// network
pub fn mock_session(
	transport: Arc<MockTransport>,
	vault: Arc<dyn CredentialVault>,
) -> Result<Arc<SessionManager>, TransportBuildError> {
	SessionManager::new(
		ClientConfig::with_api_url(TEST_API_URL),
		vault,
		MockTransportFactory::new(transport),
		Arc::new(AssumeUnmetered),
		false,
	)
	.map(Arc::new)
}
