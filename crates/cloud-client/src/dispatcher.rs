use crate::{
	classify::classify,
	network::{admit, PathMonitor},
	session::{Session, SessionManager},
	ApiRequest, ApiResponse, ClientConfig, ClientError,
};

use std::sync::Arc;

use tracing::{debug, instrument};

/// Sends requests on behalf of whoever is logged in on the shared [`SessionManager`]
#[derive(Debug, Clone)]
pub struct RequestDispatcher {
	session: Arc<SessionManager>,
}

impl RequestDispatcher {
	#[must_use]
	pub const fn new(session: Arc<SessionManager>) -> Self {
		Self { session }
	}

	#[must_use]
	pub const fn session(&self) -> &Arc<SessionManager> {
		&self.session
	}

	/// Performs exactly one attempt of `request`.
	///
	/// The session is read once, up front: a request keeps the credential, policy and transport
	/// it started with. A credentialed request the server answers with an expired session logs
	/// that session out before the error is returned.
	#[instrument(
		skip_all,
		fields(method = %request.method(), path = %request.path()),
	)]
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
		let snapshot = self.session.snapshot();
		let attached = request.attaches_credential();

		let res = execute(
			self.session.config(),
			self.session.monitor(),
			&snapshot,
			request,
		)
		.await;

		match &res {
			Err(ClientError::SessionExpired) if attached => {
				if let Some(credential) = snapshot.credential() {
					self.session.force_logout(snapshot.generation(), credential);
				}
			}
			Err(ClientError::Cancelled) => debug!("Request cancelled"),
			Err(e) => debug!(%e, "Request failed;"),
			Ok(response) => debug!(status = response.status(), "Request succeeded"),
		}

		res
	}
}

/// One attempt of `request` against an explicit session snapshot
pub(crate) async fn execute(
	config: &ClientConfig,
	monitor: &dyn PathMonitor,
	session: &Session,
	request: ApiRequest,
) -> Result<ApiResponse, ClientError> {
	let cancel = request.cancellation().clone();
	if cancel.is_cancelled() {
		return Err(ClientError::Cancelled);
	}

	let credential = if request.attaches_credential() {
		Some(session.credential().ok_or(ClientError::Unauthenticated)?)
	} else {
		None
	};
	let attached = credential.is_some();

	admit(monitor.current_path(), session.allow_metered())?;

	let attempt = session
		.transport()
		.execute(request.into_http(config, credential));

	tokio::select! {
		biased;

		() = cancel.cancelled() => Err(ClientError::Cancelled),
		// The identity this request was sent for is gone
		() = session.teardown().cancelled(), if attached => Err(ClientError::Unauthenticated),
		outcome = attempt => classify(outcome).map(ApiResponse::from),
	}
}
