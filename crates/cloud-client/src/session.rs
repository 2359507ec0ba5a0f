//! Who is logged in, with which credential, over which transport.
//!
//! [`SessionManager`] owns the one active [`Session`] and is the only thing allowed to change it.
//! Every change publishes a fresh immutable snapshot, so requests already on their way keep
//! seeing the session they were dispatched under. Identity changes additionally cancel the old
//! snapshot's teardown token, which makes credentialed requests still bound to it fail with
//! [`ClientError::Unauthenticated`] instead of completing for an identity that is gone.
//!
//! A login or switch that fails leaves the session it started from untouched: the old binding is
//! only replaced once the new credential is in hand.

use crate::{
	dispatcher::execute,
	error::{SessionError, TransportBuildError, VaultError},
	network::PathMonitor,
	transport::{Transport, TransportFactory},
	vault::CredentialVault,
	ApiRequest, ClientConfig, ClientError, Credential, Identity,
};

use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	LoggedOut,
	Authenticating,
	LoggedIn,
}

impl fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::LoggedOut => "logged out",
			Self::Authenticating => "authenticating",
			Self::LoggedIn => "logged in",
		})
	}
}

/// Immutable snapshot of the session binding
pub struct Session {
	generation: u64,
	identity: Option<Identity>,
	credential: Option<Credential>,
	allow_metered: bool,
	transport: Arc<dyn Transport>,
	teardown: CancellationToken,
}

impl Session {
	/// Bumped every time the identity or the transport binding changes
	#[must_use]
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	#[must_use]
	pub const fn identity(&self) -> Option<&Identity> {
		self.identity.as_ref()
	}

	#[must_use]
	pub const fn allow_metered(&self) -> bool {
		self.allow_metered
	}

	pub(crate) const fn credential(&self) -> Option<&Credential> {
		self.credential.as_ref()
	}

	pub(crate) fn transport(&self) -> &dyn Transport {
		self.transport.as_ref()
	}

	pub(crate) const fn teardown(&self) -> &CancellationToken {
		&self.teardown
	}

	/// A copy bound to `credential` that no session change can tear down
	fn detached(&self, credential: Credential) -> Self {
		Self {
			generation: self.generation,
			identity: None,
			credential: Some(credential),
			allow_metered: self.allow_metered,
			transport: Arc::clone(&self.transport),
			teardown: CancellationToken::new(),
		}
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("generation", &self.generation)
			.field("identity", &self.identity)
			.field("credential", &self.credential)
			.field("allow_metered", &self.allow_metered)
			.field("torn_down", &self.teardown.is_cancelled())
			.finish_non_exhaustive()
	}
}

#[derive(Deserialize)]
struct LoginResponse {
	user_id: Identity,
	#[serde(flatten)]
	credential: Credential,
}

struct Current {
	status: SessionStatus,
	session: Arc<Session>,
}

/// Held for the whole duration of a session transition
struct Transition<'a> {
	manager: &'a SessionManager,
	_lock: MutexGuard<'a, ()>,
}

impl Drop for Transition<'_> {
	fn drop(&mut self) {
		// Only entered from a logged out session, which a failed or abandoned attempt returns to
		let mut current = self.manager.current.write();
		if current.status == SessionStatus::Authenticating {
			current.status = SessionStatus::LoggedOut;
			self.manager.status_tx.send_replace(SessionStatus::LoggedOut);
		}
	}
}

pub struct SessionManager {
	config: ClientConfig,
	vault: Arc<dyn CredentialVault>,
	factory: Arc<dyn TransportFactory>,
	monitor: Arc<dyn PathMonitor>,
	current: RwLock<Current>,
	transition: Mutex<()>,
	status_tx: watch::Sender<SessionStatus>,
	background: TaskTracker,
}

impl fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let current = self.current.read();
		f.debug_struct("SessionManager")
			.field("config", &self.config)
			.field("status", &current.status)
			.field("session", &current.session)
			.finish_non_exhaustive()
	}
}

impl SessionManager {
	/// Starts logged out
	pub fn new(
		config: ClientConfig,
		vault: Arc<dyn CredentialVault>,
		factory: Arc<dyn TransportFactory>,
		monitor: Arc<dyn PathMonitor>,
		allow_metered: bool,
	) -> Result<Self, TransportBuildError> {
		let transport = factory.build(&config.transport_options(allow_metered))?;
		let (status_tx, _) = watch::channel(SessionStatus::LoggedOut);

		Ok(Self {
			config,
			vault,
			factory,
			monitor,
			current: RwLock::new(Current {
				status: SessionStatus::LoggedOut,
				session: Arc::new(Session {
					generation: 0,
					identity: None,
					credential: None,
					allow_metered,
					transport,
					teardown: CancellationToken::new(),
				}),
			}),
			transition: Mutex::new(()),
			status_tx,
			background: TaskTracker::new(),
		})
	}

	#[must_use]
	pub const fn config(&self) -> &ClientConfig {
		&self.config
	}

	pub(crate) fn monitor(&self) -> &dyn PathMonitor {
		self.monitor.as_ref()
	}

	#[must_use]
	pub fn snapshot(&self) -> Arc<Session> {
		Arc::clone(&self.current.read().session)
	}

	#[must_use]
	pub fn status(&self) -> SessionStatus {
		self.current.read().status
	}

	/// Status changes, forced logouts included
	#[must_use]
	pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
		self.status_tx.subscribe()
	}

	#[must_use]
	pub fn active_identity(&self) -> Option<Identity> {
		self.current.read().session.identity.clone()
	}

	#[must_use]
	pub fn cellular_allowed(&self) -> bool {
		self.current.read().session.allow_metered
	}

	/// The access token of the active session, if any
	#[must_use]
	pub fn access_token(&self) -> Option<String> {
		self.current
			.read()
			.session
			.credential
			.as_ref()
			.map(|credential| credential.access_token.clone())
	}

	/// Identities with a credential in the vault, for account switchers
	pub async fn known_identities(&self) -> Result<Vec<Identity>, VaultError> {
		self.vault.list_identities().await
	}

	/// Logs in with a username and password, stores the issued credential and makes its identity
	/// the active one
	#[instrument(skip(self, password), err)]
	pub async fn authenticate(
		&self,
		username: &str,
		password: &str,
	) -> Result<Identity, SessionError> {
		let _transition = self.begin()?;
		self.mark_authenticating();

		let request = ApiRequest::post("/auth/login")
			.anonymous()
			.json(&json!({ "username": username, "password": password }));

		let response = match execute(
			&self.config,
			self.monitor(),
			&self.snapshot(),
			request,
		)
		.await
		{
			Ok(response) => response,
			Err(ClientError::SessionExpired | ClientError::ServerRejected(401 | 403)) => {
				return Err(SessionError::AuthRejected)
			}
			Err(e) => return Err(e.into()),
		};

		let LoginResponse {
			user_id,
			credential,
		} = response.json()?;

		self.vault.save(&credential, &user_id).await?;
		self.bind(SessionStatus::LoggedIn, user_id.clone(), credential)?;

		info!(identity = %user_id, "Logged in");

		Ok(user_id)
	}

	/// Makes `identity` active using the credential stored for it
	#[instrument(skip(self), err)]
	pub async fn activate(&self, identity: Identity) -> Result<(), SessionError> {
		let _transition = self.begin()?;
		self.mark_authenticating();

		let credential = self
			.vault
			.read(&identity)
			.await?
			.ok_or_else(|| SessionError::NoStoredCredential(identity.clone()))?;

		self.bind(SessionStatus::LoggedIn, identity.clone(), credential)?;

		info!(%identity, "Switched identity");

		Ok(())
	}

	/// Logs `identity` out for good.
	///
	/// An active session is torn down right away and the stored credential is deleted no matter
	/// what. Telling the server happens in the background and its failure is only logged.
	#[instrument(skip(self), err)]
	pub async fn revoke(&self, identity: Identity) -> Result<(), SessionError> {
		let _transition = self.begin()?;

		let snapshot = self.snapshot();
		let credential = if snapshot.identity() == Some(&identity) {
			self.log_out_locally();
			Ok(snapshot.credential.clone())
		} else {
			self.vault.read(&identity).await
		};

		match &credential {
			Ok(Some(credential)) => self.notify_revoked(&snapshot, credential.clone()),
			Ok(None) => debug!("No credential to revoke on the server"),
			Err(e) => warn!(%e, "Couldn't read the credential, skipping server revocation;"),
		}

		self.vault.delete(&identity).await?;
		credential?;

		info!(%identity, "Logged out");

		Ok(())
	}

	/// Exchanges the refresh token for a new credential.
	///
	/// The transport and generation stay the same, requests already dispatched keep the
	/// credential they captured.
	#[instrument(skip(self), err)]
	pub async fn refresh(&self) -> Result<(), SessionError> {
		let _transition = self.begin()?;

		let snapshot = self.snapshot();
		let (Some(identity), Some(credential)) = (snapshot.identity(), snapshot.credential())
		else {
			return Err(ClientError::Unauthenticated.into());
		};
		let Some(refresh_token) = credential.refresh_token.as_deref() else {
			return Err(ClientError::Unauthenticated.into());
		};

		let request = ApiRequest::post("/auth/refresh")
			.anonymous()
			.json(&json!({ "refresh_token": refresh_token }));

		let response = match execute(&self.config, self.monitor(), &snapshot, request).await {
			Ok(response) => response,
			Err(ClientError::SessionExpired) => {
				self.force_logout(snapshot.generation, credential);
				return Err(ClientError::SessionExpired.into());
			}
			Err(e) => return Err(e.into()),
		};

		let mut renewed = response.json::<Credential>()?;
		if renewed.refresh_token.is_none() {
			renewed.refresh_token = credential.refresh_token.clone();
		}

		self.vault.save(&renewed, identity).await?;

		let mut current = self.current.write();
		let session = &current.session;
		if session.generation == snapshot.generation
			&& session.credential.as_ref() == Some(credential)
		{
			let rotated = Session {
				generation: session.generation,
				identity: session.identity.clone(),
				credential: Some(renewed),
				allow_metered: session.allow_metered,
				transport: Arc::clone(&session.transport),
				teardown: session.teardown.clone(),
			};
			current.session = Arc::new(rotated);

			debug!(%identity, "Credential rotated");
		}

		Ok(())
	}

	/// Changes whether metered networks may be used. Never interrupts calls in flight.
	#[instrument(skip(self), err)]
	pub fn set_cellular_allowed(&self, allowed: bool) -> Result<(), SessionError> {
		let mut current = self.current.write();
		if current.session.allow_metered == allowed {
			return Ok(());
		}

		let transport = if self.factory.binds_interfaces() {
			self.factory
				.build(&self.config.transport_options(allowed))?
		} else {
			Arc::clone(&current.session.transport)
		};

		let session = &current.session;
		let rebound = Session {
			generation: session.generation,
			identity: session.identity.clone(),
			credential: session.credential.clone(),
			allow_metered: allowed,
			transport,
			teardown: session.teardown.clone(),
		};
		current.session = Arc::new(rebound);

		info!(allowed, "Changed metered network policy");

		Ok(())
	}

	/// Waits for background work, such as server revocations, to finish.
	///
	/// Call before the runtime goes away, bounding the wait with a timeout if the network may hang.
	pub async fn flush(&self) {
		self.background.close();
		self.background.wait().await;
		self.background.reopen();
	}

	/// Logs out the session that produced a rejection, unless it has since been replaced
	pub(crate) fn force_logout(&self, generation: u64, rejected: &Credential) -> bool {
		let mut current = self.current.write();
		if current.session.generation != generation
			|| current.session.credential.as_ref() != Some(rejected)
		{
			debug!(generation, "Ignoring a rejection from a replaced session");
			return false;
		}

		warn!(
			identity = ?current.session.identity,
			"The server no longer accepts the session, logging out;"
		);
		self.replace_logged_out(&mut current);

		true
	}

	fn begin(&self) -> Result<Transition<'_>, SessionError> {
		self.transition
			.try_lock()
			.map(|lock| Transition {
				manager: self,
				_lock: lock,
			})
			.map_err(|_| SessionError::Busy)
	}

	fn bind(
		&self,
		status: SessionStatus,
		identity: Identity,
		credential: Credential,
	) -> Result<(), TransportBuildError> {
		let mut current = self.current.write();
		let allow_metered = current.session.allow_metered;
		let transport = self
			.factory
			.build(&self.config.transport_options(allow_metered))?;

		let session = Session {
			generation: current.session.generation + 1,
			identity: Some(identity),
			credential: Some(credential),
			allow_metered,
			transport,
			teardown: CancellationToken::new(),
		};
		Self::replace(&mut current, &self.status_tx, status, session);

		Ok(())
	}

	/// Publishes `Authenticating` when starting from a logged out session. A live session keeps
	/// serving requests until [`SessionManager::bind`] replaces it.
	fn mark_authenticating(&self) {
		let mut current = self.current.write();
		if current.status == SessionStatus::LoggedOut {
			current.status = SessionStatus::Authenticating;
			self.status_tx.send_replace(SessionStatus::Authenticating);
		}
	}

	fn log_out_locally(&self) {
		self.replace_logged_out(&mut self.current.write());
	}

	fn replace_logged_out(&self, current: &mut Current) {
		let allow_metered = current.session.allow_metered;
		let transport = self
			.factory
			.build(&self.config.transport_options(allow_metered))
			.unwrap_or_else(|e| {
				warn!(%e, "Couldn't build a fresh transport, keeping the previous one;");
				Arc::clone(&current.session.transport)
			});

		let session = Session {
			generation: current.session.generation + 1,
			identity: None,
			credential: None,
			allow_metered,
			transport,
			teardown: CancellationToken::new(),
		};

		Self::replace(current, &self.status_tx, SessionStatus::LoggedOut, session);
	}

	fn replace(
		current: &mut Current,
		status_tx: &watch::Sender<SessionStatus>,
		status: SessionStatus,
		session: Session,
	) {
		let previous = std::mem::replace(&mut current.session, Arc::new(session));
		previous.teardown.cancel();

		current.status = status;
		status_tx.send_replace(status);
	}

	fn notify_revoked(&self, snapshot: &Session, credential: Credential) {
		let config = self.config.clone();
		let monitor = Arc::clone(&self.monitor);
		let session = snapshot.detached(credential);

		self.background.spawn(async move {
			match execute(
				&config,
				monitor.as_ref(),
				&session,
				ApiRequest::post("/auth/revoke"),
			)
			.await
			{
				Ok(_) => debug!("Server acknowledged the revocation"),
				Err(e) => warn!(
					%e,
					"Server revocation failed, the credential was removed locally anyway;"
				),
			}
		});
	}
}
