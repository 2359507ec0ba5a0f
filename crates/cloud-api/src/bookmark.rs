use crate::{segment, CloudApi, Node};

use nb_cloud_client::{ApiRequest, ClientError};

pub use list::exec as list;
pub mod list {
	use super::*;

	pub async fn exec(api: &CloudApi) -> Result<Vec<Node>, ClientError> {
		api.fetch(ApiRequest::get("/bookmarks")).await
	}
}

pub use set::exec as set;
pub mod set {
	use super::*;

	pub async fn exec(api: &CloudApi, node_id: &str) -> Result<(), ClientError> {
		api.send(ApiRequest::put(format!(
			"/nodes/{}/bookmark",
			segment(node_id)
		)))
		.await
		.map(|_| ())
	}
}

pub use clear::exec as clear;
pub mod clear {
	use super::*;

	pub async fn exec(api: &CloudApi, node_id: &str) -> Result<(), ClientError> {
		api.send(ApiRequest::delete(format!(
			"/nodes/{}/bookmark",
			segment(node_id)
		)))
		.await
		.map(|_| ())
	}
}
