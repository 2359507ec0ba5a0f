//! Maps raw transport outcomes into [`ClientError`]. Everything here is pure.

use crate::{
	transport::{HttpResponse, TransportFailure, TransportOutcome},
	ClientError,
};

use serde::Deserialize;

const INVALID_SESSION: &str = "invalid_session";

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	code: Option<String>,
}

/// Lets 2xx responses through and maps everything else to exactly one taxonomy member
pub fn classify(outcome: TransportOutcome) -> Result<HttpResponse, ClientError> {
	match outcome {
		Ok(response) => match classify_status(response.status, &response.body) {
			None => Ok(response),
			Some(e) => Err(e),
		},
		Err(failure) => Err(classify_failure(&failure)),
	}
}

#[must_use]
pub const fn classify_failure(failure: &TransportFailure) -> ClientError {
	match failure {
		TransportFailure::Timeout => ClientError::TimedOut,
		// A server we cannot talk to securely is as good as unreachable
		TransportFailure::NoRoute | TransportFailure::Tls(_) | TransportFailure::Io(_) => {
			ClientError::OfflineOrUnreachable
		}
	}
}

/// `None` for success statuses
#[must_use]
pub fn classify_status(status: u16, body: &[u8]) -> Option<ClientError> {
	match status {
		200..=299 => None,
		401 => Some(ClientError::SessionExpired),
		403 if reports_invalid_session(body) => Some(ClientError::SessionExpired),
		_ => Some(ClientError::ServerRejected(status)),
	}
}

fn reports_invalid_session(body: &[u8]) -> bool {
	serde_json::from_slice::<ErrorBody>(body).is_ok_and(|body| {
		body.error.as_deref() == Some(INVALID_SESSION)
			|| body.code.as_deref() == Some(INVALID_SESSION)
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(status: u16) -> TransportOutcome {
		Ok(HttpResponse {
			status,
			body: Vec::new(),
		})
	}

	#[test]
	fn fixed_outcome_table() {
		let table: Vec<(TransportOutcome, Result<u16, ClientError>)> = vec![
			(Err(TransportFailure::Timeout), Err(ClientError::TimedOut)),
			(
				Err(TransportFailure::NoRoute),
				Err(ClientError::OfflineOrUnreachable),
			),
			(
				Err(TransportFailure::Tls("invalid peer certificate".into())),
				Err(ClientError::OfflineOrUnreachable),
			),
			(
				Err(TransportFailure::Io("connection reset".into())),
				Err(ClientError::OfflineOrUnreachable),
			),
			(response(200), Ok(200)),
			(response(204), Ok(204)),
			(response(400), Err(ClientError::ServerRejected(400))),
			(response(401), Err(ClientError::SessionExpired)),
			(response(403), Err(ClientError::ServerRejected(403))),
			(response(404), Err(ClientError::ServerRejected(404))),
			(response(409), Err(ClientError::ServerRejected(409))),
			(response(500), Err(ClientError::ServerRejected(500))),
			(response(502), Err(ClientError::ServerRejected(502))),
			(response(503), Err(ClientError::ServerRejected(503))),
		];

		for (outcome, expected) in table {
			let label = format!("{outcome:?}");
			assert_eq!(
				classify(outcome).map(|response| response.status),
				expected,
				"{label}"
			);
		}
	}

	#[test]
	fn forbidden_with_invalid_session_marker_is_an_expired_session() {
		for body in [
			br#"{"error":"invalid_session"}"#.as_slice(),
			br#"{"code":"invalid_session","message":"token revoked"}"#.as_slice(),
		] {
			assert_eq!(
				classify_status(403, body),
				Some(ClientError::SessionExpired)
			);
		}

		assert_eq!(
			classify_status(403, br#"{"error":"quota_exceeded"}"#),
			Some(ClientError::ServerRejected(403))
		);
		assert_eq!(
			classify_status(403, b"<html>forbidden</html>"),
			Some(ClientError::ServerRejected(403))
		);
	}

	#[test]
	fn success_bodies_are_untouched() {
		let outcome = Ok(HttpResponse {
			status: 200,
			body: br#"{"error":"invalid_session"}"#.to_vec(),
		});

		assert_eq!(
			classify(outcome).map(|response| response.body),
			Ok(br#"{"error":"invalid_session"}"#.to_vec())
		);
	}

	#[test]
	fn only_offline_and_timeout_are_transient() {
		assert!(ClientError::TimedOut.is_transient());
		assert!(ClientError::OfflineOrUnreachable.is_transient());
		assert!(!ClientError::SessionExpired.is_transient());
		assert!(!ClientError::InterfaceNotAllowed.is_transient());
		assert!(!ClientError::Cancelled.should_report());
		assert!(ClientError::ServerRejected(409).should_report());
	}
}
