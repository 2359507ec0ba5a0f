use crate::{segment, CloudApi, Share, SharePermission};

use nb_cloud_client::{ApiRequest, ClientError};

use serde_json::json;

pub use list::exec as list;
pub mod list {
	use super::*;

	pub async fn exec(api: &CloudApi, node_id: &str) -> Result<Vec<Share>, ClientError> {
		api.fetch(ApiRequest::get(format!(
			"/nodes/{}/shares",
			segment(node_id)
		)))
		.await
	}
}

pub use create::exec as create;
pub mod create {
	use super::*;

	/// Shares a node with every recipient at once, returning one share per recipient
	pub async fn exec(
		api: &CloudApi,
		node_id: &str,
		recipients: &[String],
		permission: SharePermission,
	) -> Result<Vec<Share>, ClientError> {
		api.fetch(
			ApiRequest::post(format!("/nodes/{}/shares", segment(node_id))).json(&json!({
				"recipients": recipients,
				"permission": permission,
			})),
		)
		.await
	}
}

pub use update::exec as update;
pub mod update {
	use super::*;

	pub async fn exec(
		api: &CloudApi,
		share_id: &str,
		permission: SharePermission,
	) -> Result<Share, ClientError> {
		api.fetch(
			ApiRequest::patch(format!("/shares/{}", segment(share_id)))
				.json(&json!({ "permission": permission })),
		)
		.await
	}
}

pub use delete::exec as delete;
pub mod delete {
	use super::*;

	pub async fn exec(api: &CloudApi, share_id: &str) -> Result<(), ClientError> {
		api.send(ApiRequest::delete(format!("/shares/{}", segment(share_id))))
			.await
			.map(|_| ())
	}
}
