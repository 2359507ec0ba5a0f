use crate::{segment, CloudApi, User};

use nb_cloud_client::{join, ApiRequest, ClientError, Identity};

pub use me::exec as me;
pub mod me {
	use super::*;

	pub async fn exec(api: &CloudApi) -> Result<User, ClientError> {
		api.fetch(ApiRequest::get("/users/me")).await
	}
}

pub use get::exec as get;
pub mod get {
	use super::*;

	pub async fn exec(api: &CloudApi, user_id: &Identity) -> Result<User, ClientError> {
		api.fetch(ApiRequest::get(format!(
			"/users/{}",
			segment(user_id.as_str())
		)))
		.await
	}
}

pub use refresh_many::exec as refresh_many;
pub mod refresh_many {
	use super::*;

	/// Fetches every user concurrently. One failing lookup does not cancel the others, each
	/// user gets its own result.
	pub async fn exec(
		api: &CloudApi,
		user_ids: &[Identity],
	) -> Vec<(Identity, Result<User, ClientError>)> {
		let results =
			join::all_settled(user_ids.iter().map(|user_id| super::get(api, user_id)).collect())
				.await;

		user_ids.iter().cloned().zip(results).collect()
	}
}
