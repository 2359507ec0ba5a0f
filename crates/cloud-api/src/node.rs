use crate::{segment, CloudApi, Node};

use nb_cloud_client::{ApiRequest, ClientError};

use serde_json::json;

pub use get::exec as get;
pub mod get {
	use super::*;

	pub async fn exec(api: &CloudApi, node_id: &str) -> Result<Node, ClientError> {
		api.fetch(ApiRequest::get(format!("/nodes/{}", segment(node_id))))
			.await
	}
}

pub use list::exec as list;
pub mod list {
	use super::*;

	/// Children of a directory
	pub async fn exec(api: &CloudApi, folder_id: &str) -> Result<Vec<Node>, ClientError> {
		api.fetch(ApiRequest::get(format!(
			"/nodes/{}/children",
			segment(folder_id)
		)))
		.await
	}
}

pub use create_folder::exec as create_folder;
pub mod create_folder {
	use super::*;

	pub async fn exec(api: &CloudApi, parent_id: &str, name: &str) -> Result<Node, ClientError> {
		api.fetch(
			ApiRequest::post(format!("/nodes/{}/children", segment(parent_id))).json(&json!({
				"name": name,
				"kind": "directory",
			})),
		)
		.await
	}
}

pub use rename::exec as rename;
pub mod rename {
	use super::*;

	pub async fn exec(api: &CloudApi, node_id: &str, name: &str) -> Result<Node, ClientError> {
		api.fetch(
			ApiRequest::patch(format!("/nodes/{}", segment(node_id)))
				.json(&json!({ "name": name })),
		)
		.await
	}
}

pub use move_to::exec as move_to;
pub mod move_to {
	use super::*;

	pub async fn exec(
		api: &CloudApi,
		node_id: &str,
		destination_id: &str,
	) -> Result<Node, ClientError> {
		api.fetch(
			ApiRequest::post(format!("/nodes/{}/move", segment(node_id)))
				.json(&json!({ "destinationId": destination_id })),
		)
		.await
	}
}

pub use copy_to::exec as copy_to;
pub mod copy_to {
	use super::*;

	/// Returns the newly created copy
	pub async fn exec(
		api: &CloudApi,
		node_id: &str,
		destination_id: &str,
	) -> Result<Node, ClientError> {
		api.fetch(
			ApiRequest::post(format!("/nodes/{}/copy", segment(node_id)))
				.json(&json!({ "destinationId": destination_id })),
		)
		.await
	}
}

pub use delete::exec as delete;
pub mod delete {
	use super::*;

	pub async fn exec(api: &CloudApi, node_id: &str) -> Result<(), ClientError> {
		api.send(ApiRequest::delete(format!("/nodes/{}", segment(node_id))))
			.await
			.map(|_| ())
	}
}
