use crate::{
	testing::{
		mock_session, path_of, GatedVault, MockReply, MockTransport, MockTransportFactory,
		TEST_API_URL,
	},
	transport::{HttpRequest, HttpResponse, TransportFailure},
	ApiRequest, ClientConfig, ClientError, Credential, CredentialVault, Identity,
	ManualPathMonitor, MemoryVault, NetworkPath, RequestDispatcher, SessionError, SessionManager,
	SessionStatus,
};

use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::{sync::Notify, task::yield_now, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn login_reply(user: &str) -> MockReply {
	MockReply::json(
		200,
		&json!({
			"user_id": user,
			"access_token": format!("{user}-token"),
			"token_type": "Bearer",
			"refresh_token": format!("{user}-refresh"),
		}),
	)
}

/// Logs in whoever the username names, unless the password is `wrong`, and answers everything
/// else through `rest`
fn routed(
	rest: impl Fn(&str, &HttpRequest) -> MockReply + Send + Sync + 'static,
) -> Arc<MockTransport> {
	MockTransport::new(move |request| {
		let path = path_of(&request.url);
		if path.ends_with("/auth/login") {
			let body = request
				.body
				.as_deref()
				.and_then(|body| serde_json::from_slice::<serde_json::Value>(body).ok())
				.unwrap_or_default();
			if body["password"] == "wrong" {
				return MockReply::status(401);
			}
			return login_reply(body["username"].as_str().unwrap_or_default());
		}

		rest(path.trim_start_matches(TEST_API_URL), request)
	})
}

async fn logged_in(
	transport: Arc<MockTransport>,
	vault: Arc<dyn CredentialVault>,
) -> (Arc<SessionManager>, RequestDispatcher) {
	let session = mock_session(transport, vault).unwrap();
	session.authenticate("alice", "hunter2").await.unwrap();

	(Arc::clone(&session), RequestDispatcher::new(session))
}

#[tokio::test]
#[traced_test]
async fn authenticate_stores_the_credential_and_logs_in() {
	let vault = Arc::new(MemoryVault::new());
	let transport = routed(|_, _| MockReply::status(404));
	let session = mock_session(Arc::clone(&transport), vault.clone()).unwrap();
	let mut status = session.subscribe();

	let identity = session.authenticate("alice", "hunter2").await.unwrap();

	assert_eq!(identity, Identity::from("alice"));
	assert_eq!(session.status(), SessionStatus::LoggedIn);
	assert_eq!(*status.borrow_and_update(), SessionStatus::LoggedIn);
	assert_eq!(session.access_token().as_deref(), Some("alice-token"));
	assert_eq!(
		vault.read(&identity).await.unwrap(),
		Some(Credential::bearer("alice-token").with_refresh_token("alice-refresh"))
	);
	assert_eq!(
		session.known_identities().await.unwrap(),
		vec![Identity::from("alice")]
	);

	let login = &transport.requests()[0];
	assert_eq!(login.header("Authorization"), None);
	assert!(!logs_contain("hunter2"));
}

#[tokio::test]
async fn rejected_login_settles_logged_out() {
	let session = mock_session(
		MockTransport::new(|_| MockReply::status(401)),
		Arc::new(MemoryVault::new()),
	)
	.unwrap();

	assert!(matches!(
		session.authenticate("alice", "wrong").await,
		Err(SessionError::AuthRejected)
	));
	assert_eq!(session.status(), SessionStatus::LoggedOut);
	assert_eq!(session.active_identity(), None);
}

#[tokio::test]
async fn failed_switch_keeps_the_active_identity() {
	let transport = routed(|_, _| MockReply::json(200, &json!([])));
	let (session, dispatcher) =
		logged_in(Arc::clone(&transport), Arc::new(MemoryVault::new())).await;
	let mut status = session.subscribe();
	status.borrow_and_update();

	assert!(matches!(
		session.activate(Identity::from("nobody")).await,
		Err(SessionError::NoStoredCredential(identity)) if identity == Identity::from("nobody")
	));
	assert!(matches!(
		session.authenticate("alice", "wrong").await,
		Err(SessionError::AuthRejected)
	));

	assert_eq!(session.status(), SessionStatus::LoggedIn);
	assert_eq!(session.active_identity(), Some(Identity::from("alice")));
	assert!(!status.has_changed().unwrap());

	dispatcher.send(ApiRequest::get("/mounts")).await.unwrap();
	let mounts = transport.requests_to("/mounts");
	assert_eq!(mounts[0].header("Authorization"), Some("Bearer alice-token"));
}

#[tokio::test]
async fn concurrent_transition_is_busy() {
	let vault = GatedVault::new();
	vault.gate_reads(true);
	let session = mock_session(
		MockTransport::new(|_| MockReply::status(500)),
		vault.clone(),
	)
	.unwrap();

	let first = tokio::spawn({
		let session = Arc::clone(&session);
		async move { session.activate(Identity::from("alice")).await }
	});

	vault.entered().await;
	assert_eq!(session.status(), SessionStatus::Authenticating);
	assert!(matches!(
		session.activate(Identity::from("bob")).await,
		Err(SessionError::Busy)
	));

	vault.release();
	assert!(matches!(
		first.await.unwrap(),
		Err(SessionError::NoStoredCredential(identity)) if identity == Identity::from("alice")
	));
	assert_eq!(session.status(), SessionStatus::LoggedOut);
}

#[tokio::test(start_paused = true)]
async fn abandoned_transition_settles_logged_out() {
	let vault = GatedVault::new();
	vault
		.save(&Credential::bearer("bob-token"), &Identity::from("bob"))
		.await
		.unwrap();
	vault.gate_reads(true);
	let session = mock_session(MockTransport::new(|_| MockReply::status(200)), vault.clone())
		.unwrap();

	assert!(timeout(
		Duration::from_secs(1),
		session.activate(Identity::from("bob"))
	)
	.await
	.is_err());
	assert_eq!(session.status(), SessionStatus::LoggedOut);

	vault.gate_reads(false);
	session.activate(Identity::from("bob")).await.unwrap();
	assert_eq!(session.status(), SessionStatus::LoggedIn);
}

#[tokio::test]
#[traced_test]
async fn expired_session_forces_logout() {
	let vault = Arc::new(MemoryVault::new());
	let transport = routed(|path, _| match path {
		"/users/me" => MockReply::status(401),
		_ => MockReply::status(404),
	});
	let (session, dispatcher) = logged_in(Arc::clone(&transport), vault.clone()).await;
	let mut status = session.subscribe();

	assert_eq!(
		dispatcher.send(ApiRequest::get("/users/me")).await,
		Err(ClientError::SessionExpired)
	);
	assert_eq!(session.status(), SessionStatus::LoggedOut);
	assert!(status.has_changed().unwrap());
	assert_eq!(*status.borrow_and_update(), SessionStatus::LoggedOut);

	assert_eq!(
		dispatcher.send(ApiRequest::get("/users/me")).await,
		Err(ClientError::Unauthenticated)
	);
	assert_eq!(transport.requests_to("/users/me").len(), 1);

	// Only the in-memory session is dropped, the stored credential can be activated again
	assert!(vault.read(&Identity::from("alice")).await.unwrap().is_some());
	session.activate(Identity::from("alice")).await.unwrap();
	assert_eq!(session.status(), SessionStatus::LoggedIn);
}

#[tokio::test]
async fn stale_rejection_does_not_log_out_a_newer_session() {
	let (session, _) = logged_in(
		routed(|_, _| MockReply::status(200)),
		Arc::new(MemoryVault::new()),
	)
	.await;
	let old = session.snapshot();

	session.activate(Identity::from("alice")).await.unwrap();
	let old_credential = Credential::bearer("alice-token").with_refresh_token("alice-refresh");

	assert!(!session.force_logout(old.generation(), &old_credential));
	assert_eq!(session.status(), SessionStatus::LoggedIn);

	let current = session.snapshot();
	assert!(!session.force_logout(current.generation(), &Credential::bearer("other")));
	assert!(session.force_logout(current.generation(), &old_credential));
	assert_eq!(session.status(), SessionStatus::LoggedOut);
}

#[tokio::test]
async fn logged_out_requests_never_reach_the_network() {
	let transport = MockTransport::new(|_| MockReply::status(200));
	let session = mock_session(Arc::clone(&transport), Arc::new(MemoryVault::new())).unwrap();
	let dispatcher = RequestDispatcher::new(session);

	assert_eq!(
		dispatcher.send(ApiRequest::get("/mounts")).await,
		Err(ClientError::Unauthenticated)
	);
	assert!(dispatcher
		.send(ApiRequest::get("/status").anonymous())
		.await
		.is_ok());
	assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn cancellation_is_isolated_to_its_own_request() {
	let gate = Arc::new(Notify::new());
	let transport = routed({
		let gate = Arc::clone(&gate);
		move |path, _| match path {
			"/nodes/slow" => MockReply::Pending,
			_ => MockReply::Gated(
				Arc::clone(&gate),
				Ok(HttpResponse {
					status: 200,
					body: b"{}".to_vec(),
				}),
			),
		}
	});
	let (_session, dispatcher) =
		logged_in(Arc::clone(&transport), Arc::new(MemoryVault::new())).await;

	let scope = CancellationToken::new();
	let (cancelled, completed) = tokio::join!(
		dispatcher.send(ApiRequest::get("/nodes/slow").cancel_with(&scope)),
		async {
			yield_now().await;
			scope.cancel();
			gate.notify_one();
			dispatcher.send(ApiRequest::get("/nodes/fast")).await
		}
	);

	assert_eq!(cancelled, Err(ClientError::Cancelled));
	assert_eq!(completed.map(|response| response.status()), Ok(200));

	let before = transport.request_count();
	let done = CancellationToken::new();
	done.cancel();
	assert_eq!(
		dispatcher
			.send(ApiRequest::get("/nodes/fast").cancel_with(&done))
			.await,
		Err(ClientError::Cancelled)
	);
	assert_eq!(transport.request_count(), before);
}

#[tokio::test]
async fn identity_switch_fails_in_flight_credentialed_requests() {
	let vault = Arc::new(MemoryVault::new());
	let transport = routed(|path, _| match path {
		"/nodes/slow" => MockReply::Pending,
		_ => MockReply::json(200, &json!({})),
	});
	let (session, dispatcher) = logged_in(Arc::clone(&transport), vault.clone()).await;
	vault
		.save(&Credential::bearer("bob-token"), &Identity::from("bob"))
		.await
		.unwrap();

	let (in_flight, switched) = tokio::join!(
		dispatcher.send(ApiRequest::get("/nodes/slow")),
		async {
			yield_now().await;
			session.activate(Identity::from("bob")).await
		}
	);

	assert_eq!(in_flight, Err(ClientError::Unauthenticated));
	switched.unwrap();
	assert_eq!(session.active_identity(), Some(Identity::from("bob")));

	dispatcher.send(ApiRequest::get("/mounts")).await.unwrap();
	let mounts = transport.requests_to("/mounts");
	assert_eq!(mounts[0].header("Authorization"), Some("Bearer bob-token"));
}

#[tokio::test]
#[traced_test]
async fn revoke_logs_out_locally_even_when_offline() {
	let vault = Arc::new(MemoryVault::new());
	let transport = routed(|path, _| match path {
		"/auth/revoke" => MockReply::failure(TransportFailure::NoRoute),
		_ => MockReply::status(200),
	});
	let (session, _) = logged_in(Arc::clone(&transport), vault.clone()).await;

	session.revoke(Identity::from("alice")).await.unwrap();

	assert_eq!(session.status(), SessionStatus::LoggedOut);
	assert_eq!(session.access_token(), None);
	assert_eq!(vault.read(&Identity::from("alice")).await.unwrap(), None);

	session.flush().await;
	let revoke = transport.requests_to("/auth/revoke");
	assert_eq!(revoke.len(), 1);
	assert_eq!(revoke[0].header("Authorization"), Some("Bearer alice-token"));
	assert!(logs_contain("Server revocation failed"));
}

#[tokio::test(start_paused = true)]
async fn flush_waits_for_the_revocation_notice() {
	let gate = Arc::new(Notify::new());
	let transport = routed({
		let gate = Arc::clone(&gate);
		move |path, _| match path {
			"/auth/revoke" => MockReply::Gated(
				Arc::clone(&gate),
				Ok(HttpResponse {
					status: 204,
					body: Vec::new(),
				}),
			),
			_ => MockReply::status(200),
		}
	});
	let (session, _) = logged_in(Arc::clone(&transport), Arc::new(MemoryVault::new())).await;

	session.revoke(Identity::from("alice")).await.unwrap();

	assert!(timeout(Duration::from_secs(1), session.flush()).await.is_err());
	assert_eq!(transport.requests_to("/auth/revoke").len(), 1);

	gate.notify_one();
	session.flush().await;

	// Background work started after a flush is tracked as well
	session.authenticate("bob", "hunter2").await.unwrap();
	session.revoke(Identity::from("bob")).await.unwrap();
	gate.notify_one();
	session.flush().await;
	assert_eq!(transport.requests_to("/auth/revoke").len(), 2);
}

#[test]
fn revocation_reaches_the_server_before_the_runtime_shuts_down() {
	let transport = routed(|_, _| MockReply::status(200));
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.unwrap();

	runtime.block_on(async {
		let (session, _) =
			logged_in(Arc::clone(&transport), Arc::new(MemoryVault::new())).await;
		session.revoke(Identity::from("alice")).await.unwrap();
		session.flush().await;
	});
	drop(runtime);

	assert_eq!(transport.requests_to("/auth/revoke").len(), 1);
}

#[tokio::test]
async fn revoke_deletes_even_when_the_vault_read_fails() {
	let vault = GatedVault::new();
	let transport = routed(|_, _| MockReply::status(200));
	let (session, _) = logged_in(Arc::clone(&transport), vault.clone()).await;
	vault
		.save(&Credential::bearer("bob-token"), &Identity::from("bob"))
		.await
		.unwrap();
	vault.fail_reads(true);

	assert!(matches!(
		session.revoke(Identity::from("bob")).await,
		Err(SessionError::Vault(_))
	));
	assert_eq!(
		vault.list_identities().await.unwrap(),
		vec![Identity::from("alice")]
	);
	assert!(transport.requests_to("/auth/revoke").is_empty());
	// Someone else's revocation leaves the active session alone
	assert_eq!(session.active_identity(), Some(Identity::from("alice")));
}

#[tokio::test]
async fn refresh_rotates_without_disturbing_in_flight_requests() {
	let vault = Arc::new(MemoryVault::new());
	let gate = Arc::new(Notify::new());
	let transport = routed({
		let gate = Arc::clone(&gate);
		move |path, _| match path {
			"/auth/refresh" => MockReply::json(200, &json!({ "access_token": "rotated-token" })),
			"/nodes/slow" => MockReply::Gated(
				Arc::clone(&gate),
				Ok(HttpResponse {
					status: 200,
					body: b"{}".to_vec(),
				}),
			),
			_ => MockReply::json(200, &json!({})),
		}
	});
	let (session, dispatcher) = logged_in(Arc::clone(&transport), vault.clone()).await;
	let generation = session.snapshot().generation();

	let (in_flight, refreshed) = tokio::join!(
		dispatcher.send(ApiRequest::get("/nodes/slow")),
		async {
			yield_now().await;
			let refreshed = session.refresh().await;
			gate.notify_one();
			refreshed
		}
	);

	refreshed.unwrap();
	assert_eq!(in_flight.map(|response| response.status()), Ok(200));
	assert_eq!(
		transport.requests_to("/nodes/slow")[0].header("Authorization"),
		Some("Bearer alice-token")
	);

	assert_eq!(session.snapshot().generation(), generation);
	assert_eq!(session.access_token().as_deref(), Some("rotated-token"));
	assert_eq!(
		vault.read(&Identity::from("alice")).await.unwrap(),
		Some(Credential::bearer("rotated-token").with_refresh_token("alice-refresh"))
	);

	let refresh = &transport.requests_to("/auth/refresh")[0];
	assert_eq!(refresh.header("Authorization"), None);

	// A late rejection of the replaced credential is stale
	assert!(!session.force_logout(
		generation,
		&Credential::bearer("alice-token").with_refresh_token("alice-refresh")
	));
	assert_eq!(session.status(), SessionStatus::LoggedIn);
}

#[tokio::test]
async fn rejected_refresh_logs_out() {
	let (session, _) = logged_in(
		routed(|_, _| MockReply::status(401)),
		Arc::new(MemoryVault::new()),
	)
	.await;

	assert!(matches!(
		session.refresh().await,
		Err(SessionError::Client(ClientError::SessionExpired))
	));
	assert_eq!(session.status(), SessionStatus::LoggedOut);
	assert!(matches!(
		session.refresh().await,
		Err(SessionError::Client(ClientError::Unauthenticated))
	));
}

#[tokio::test]
async fn metered_only_network_needs_permission() {
	let transport = routed(|_, _| MockReply::status(200));
	let factory = MockTransportFactory::with_interface_binding(Arc::clone(&transport), true);
	let monitor = Arc::new(ManualPathMonitor::new(NetworkPath::METERED_ONLY));
	let session = SessionManager::new(
		ClientConfig::with_api_url(TEST_API_URL),
		Arc::new(MemoryVault::new()),
		factory.clone(),
		monitor.clone(),
		false,
	)
	.unwrap();

	assert!(matches!(
		session.authenticate("alice", "hunter2").await,
		Err(SessionError::Client(ClientError::InterfaceNotAllowed))
	));
	assert_eq!(transport.request_count(), 0);

	let builds = factory.builds();
	session.set_cellular_allowed(true).unwrap();
	assert_eq!(factory.builds(), builds + 1);
	assert_eq!(factory.last_options().map(|options| options.allow_metered), Some(true));
	assert!(session.cellular_allowed());

	session.authenticate("alice", "hunter2").await.unwrap();

	monitor.set(NetworkPath::OFFLINE);
	assert_eq!(
		RequestDispatcher::new(Arc::new(session))
			.send(ApiRequest::get("/mounts"))
			.await,
		Err(ClientError::OfflineOrUnreachable)
	);
}

#[tokio::test]
async fn policy_change_keeps_the_transport_unless_it_binds_interfaces() {
	let transport = MockTransport::new(|_| MockReply::status(200));
	let factory = MockTransportFactory::new(transport);
	let session = SessionManager::new(
		ClientConfig::default(),
		Arc::new(MemoryVault::new()),
		factory.clone(),
		Arc::new(ManualPathMonitor::new(NetworkPath::UNMETERED)),
		false,
	)
	.unwrap();
	let generation = session.snapshot().generation();

	session.set_cellular_allowed(true).unwrap();

	assert_eq!(factory.builds(), 1);
	assert!(session.snapshot().allow_metered());
	assert_eq!(session.snapshot().generation(), generation);
}
