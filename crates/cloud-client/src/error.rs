use crate::Identity;

use thiserror::Error;

/// Closed taxonomy every request resolves into when it does not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
	/// No route to the server; a metered interface may help
	#[error("the server is unreachable or the device is offline")]
	OfflineOrUnreachable,
	/// The deadline passed; idempotent operations may be re-issued
	#[error("the request timed out")]
	TimedOut,
	/// Policy forbids the only interface available; only a policy change resolves it
	#[error("the only available network is metered and metered use is not allowed")]
	InterfaceNotAllowed,
	/// An authenticated endpoint was called without an active session
	#[error("no active session")]
	Unauthenticated,
	/// The server no longer accepts the credential; the session was logged out
	#[error("the session expired, sign in again")]
	SessionExpired,
	/// Any other non-2xx status
	#[error("the server rejected the request <status='{0}'>")]
	ServerRejected(u16),
	/// Caller-initiated cancellation
	#[error("the request was cancelled")]
	Cancelled,
	/// The payload did not match the expected schema
	#[error("unexpected response payload: {0}")]
	Decoded(String),
}

impl ClientError {
	/// Offline and timeout failures; re-issuing may succeed without any other change
	#[must_use]
	pub const fn is_transient(&self) -> bool {
		matches!(self, Self::OfflineOrUnreachable | Self::TimedOut)
	}

	/// Whether the failure is worth surfacing to the user at all
	#[must_use]
	pub const fn should_report(&self) -> bool {
		!matches!(self, Self::Cancelled)
	}
}

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("another session transition is already in progress")]
	Busy,
	#[error("no stored credential <identity='{0}'>")]
	NoStoredCredential(Identity),
	#[error("the server rejected the username or password")]
	AuthRejected,

	#[error(transparent)]
	Vault(#[from] VaultError),
	#[error(transparent)]
	Client(#[from] ClientError),
	#[error(transparent)]
	Transport(#[from] TransportBuildError),
}

#[derive(Debug, Error)]
pub enum VaultError {
	#[error("credential vault failure: {0}")]
	Backend(String),
	#[error("stored credential is malformed: {0}")]
	Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("failed to build the HTTP transport: {0}")]
pub struct TransportBuildError(pub String);
