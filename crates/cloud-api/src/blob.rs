//! Byte-producing operations, composed with the disk cache.
//!
//! File contents are cached under their server content hash, so the same bytes reached through
//! different nodes are stored once. Profile images are cached under the user id.

use crate::{segment, BlobError, CloudApi, Node};

use nb_cloud_client::{ApiRequest, ClientError, Identity};
use nb_disk_cache::CacheCategory;

use tracing::{debug, warn};

fn profile_image_key(user_id: &Identity) -> String {
	format!("{user_id}.png")
}

fn file_key(node: &Node) -> Option<String> {
	let hash = node.content_hash.as_deref()?;

	Some(match node.extension() {
		Some(ext) => format!("{hash}.{ext}"),
		None => hash.to_string(),
	})
}

/// Writes through to the cache; a failed write never fails the fetch it belongs to
async fn remember(api: &CloudApi, category: CacheCategory, key: &str, bytes: &[u8]) {
	if let Err(e) = api.cache().store(category, key, bytes).await {
		warn!(%category, ?e, "Failed to cache downloaded bytes;");
	}
}

pub use download::exec as download;
pub mod download {
	use super::*;

	/// Content of a file node, from the cache when possible
	pub async fn exec(api: &CloudApi, node: &Node) -> Result<Vec<u8>, BlobError> {
		let key = file_key(node);

		if let Some(key) = &key {
			if let Some(bytes) = api.cache().load(CacheCategory::FileBlob, key).await? {
				debug!(node_id = %node.id, "Serving file content from cache");
				return Ok(bytes);
			}
		}

		let bytes = api
			.send(ApiRequest::get(format!("/nodes/{}/content", segment(&node.id))))
			.await?
			.into_bytes();

		// Without a content hash there is no stable address to cache under
		if let Some(key) = &key {
			remember(api, CacheCategory::FileBlob, key, &bytes).await;
		}

		Ok(bytes)
	}
}

pub use profile_image::exec as profile_image;
pub mod profile_image {
	use super::*;

	/// A user's avatar; `None` when they have not set one
	pub async fn exec(api: &CloudApi, user_id: &Identity) -> Result<Option<Vec<u8>>, BlobError> {
		let key = profile_image_key(user_id);

		if let Some(bytes) = api.cache().load(CacheCategory::ProfileImage, &key).await? {
			return Ok(Some(bytes));
		}

		let response = match api
			.send(ApiRequest::get(format!(
				"/users/{}/avatar",
				segment(user_id.as_str())
			)))
			.await
		{
			Ok(response) => response,
			Err(ClientError::ServerRejected(404)) => return Ok(None),
			Err(e) => return Err(e.into()),
		};

		let bytes = response.into_bytes();
		remember(api, CacheCategory::ProfileImage, &key, &bytes).await;

		Ok(Some(bytes))
	}
}

pub use refresh_profile_image::exec as refresh_profile_image;
pub mod refresh_profile_image {
	use super::*;

	/// Drops the cached avatar and fetches it again
	pub async fn exec(api: &CloudApi, user_id: &Identity) -> Result<Option<Vec<u8>>, BlobError> {
		api.cache()
			.clear(CacheCategory::ProfileImage, Some(&profile_image_key(user_id)))
			.await?;

		super::profile_image(api, user_id).await
	}
}
