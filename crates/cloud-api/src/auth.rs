//! Thin pass-throughs to the session, so front ends can stay on the facade.

use crate::CloudApi;

use nb_cloud_client::{ClientError, SessionError};

pub use token::exec as token;
pub mod token {
	use super::*;

	/// The access token of the active session
	pub fn exec(api: &CloudApi) -> Result<String, ClientError> {
		api.session()
			.access_token()
			.ok_or(ClientError::Unauthenticated)
	}
}

pub use refresh::exec as refresh;
pub mod refresh {
	use super::*;

	pub async fn exec(api: &CloudApi) -> Result<(), SessionError> {
		api.session().refresh().await
	}
}
