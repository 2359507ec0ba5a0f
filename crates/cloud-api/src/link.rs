use crate::{segment, CloudApi, DownloadLink, UploadLink};

use nb_cloud_client::{ApiRequest, ClientError};

use chrono::{DateTime, Utc};
use serde_json::json;

/// Public links for downloading a node
pub mod download {
	use super::*;

	pub use list::exec as list;
	pub mod list {
		use super::*;

		pub async fn exec(api: &CloudApi, node_id: &str) -> Result<Vec<DownloadLink>, ClientError> {
			api.fetch(ApiRequest::get(format!(
				"/nodes/{}/links",
				segment(node_id)
			)))
			.await
		}
	}

	pub use create::exec as create;
	pub mod create {
		use super::*;

		pub async fn exec(
			api: &CloudApi,
			node_id: &str,
			expires_at: Option<DateTime<Utc>>,
			password: Option<&str>,
		) -> Result<DownloadLink, ClientError> {
			api.fetch(
				ApiRequest::post(format!("/nodes/{}/links", segment(node_id))).json(&json!({
					"expiresAt": expires_at,
					"password": password,
				})),
			)
			.await
		}
	}

	pub use update::exec as update;
	pub mod update {
		use super::*;

		/// `None` makes the link never expire
		pub async fn exec(
			api: &CloudApi,
			link_id: &str,
			expires_at: Option<DateTime<Utc>>,
		) -> Result<DownloadLink, ClientError> {
			api.fetch(
				ApiRequest::patch(format!("/links/download/{}", segment(link_id)))
					.json(&json!({ "expiresAt": expires_at })),
			)
			.await
		}
	}

	pub use delete::exec as delete;
	pub mod delete {
		use super::*;

		pub async fn exec(api: &CloudApi, link_id: &str) -> Result<(), ClientError> {
			api.send(ApiRequest::delete(format!(
				"/links/download/{}",
				segment(link_id)
			)))
			.await
			.map(|_| ())
		}
	}
}

/// Public links for uploading into a directory
pub mod upload {
	use super::*;

	pub use create::exec as create;
	pub mod create {
		use super::*;

		pub async fn exec(
			api: &CloudApi,
			folder_id: &str,
			expires_at: Option<DateTime<Utc>>,
		) -> Result<UploadLink, ClientError> {
			api.fetch(ApiRequest::post("/links/upload").json(&json!({
				"nodeId": folder_id,
				"expiresAt": expires_at,
			})))
			.await
		}
	}

	pub use delete::exec as delete;
	pub mod delete {
		use super::*;

		pub async fn exec(api: &CloudApi, link_id: &str) -> Result<(), ClientError> {
			api.send(ApiRequest::delete(format!(
				"/links/upload/{}",
				segment(link_id)
			)))
			.await
			.map(|_| ())
		}
	}
}
