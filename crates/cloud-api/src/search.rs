use crate::{CloudApi, MountSearchResults, Node};

use nb_cloud_client::{ApiRequest, ClientError};

use std::cmp::Ordering;

use serde::Deserialize;

/// One hit of a search, tagged with the mount it was found in
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
	pub mount_id: String,
	pub node: Node,
	pub score: f64,
}

pub use across_mounts::exec as across_mounts;
pub mod across_mounts {
	use super::*;

	#[derive(Deserialize)]
	struct Response {
		#[serde(default)]
		mounts: Vec<MountSearchResults>,
	}

	/// Searches every mount at once; directories come first, then hits by descending relevance
	pub async fn exec(api: &CloudApi, query: &str) -> Result<Vec<SearchResult>, ClientError> {
		let query = query.trim();
		if query.is_empty() {
			return Ok(Vec::new());
		}

		let Response { mounts } = api.fetch(ApiRequest::get("/search").query("q", query)).await?;

		Ok(merge(mounts))
	}
}

/// Flattens per-mount results into one list. The sort is stable, so equally ranked hits keep
/// the order the server returned them in.
#[must_use]
pub fn merge(mounts: Vec<MountSearchResults>) -> Vec<SearchResult> {
	let mut results = mounts
		.into_iter()
		.flat_map(|MountSearchResults { mount_id, hits }| {
			hits.into_iter().map(move |hit| SearchResult {
				mount_id: mount_id.clone(),
				node: hit.node,
				score: hit.score,
			})
		})
		.collect::<Vec<_>>();

	results.sort_by(|a, b| match (a.node.is_directory(), b.node.is_directory()) {
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		_ => b.score.total_cmp(&a.score),
	});

	results
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::{NodeKind, SearchHit};

	use chrono::{TimeZone, Utc};

	fn hit(id: &str, kind: NodeKind, score: f64) -> SearchHit {
		SearchHit {
			node: Node {
				id: id.to_string(),
				name: format!("{id}.txt"),
				kind,
				mount_id: String::new(),
				parent_id: None,
				size: None,
				content_hash: None,
				mime_type: None,
				modified_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
				bookmarked: false,
			},
			score,
		}
	}

	#[test]
	fn directories_first_then_by_score_keeping_ties_in_server_order() {
		let merged = merge(vec![
			MountSearchResults {
				mount_id: "m1".to_string(),
				hits: vec![
					hit("a", NodeKind::File, 0.5),
					hit("b", NodeKind::Directory, 0.1),
					hit("c", NodeKind::File, 0.9),
				],
			},
			MountSearchResults {
				mount_id: "m2".to_string(),
				hits: vec![
					hit("d", NodeKind::File, 0.5),
					hit("e", NodeKind::Directory, 0.7),
				],
			},
		]);

		assert_eq!(
			merged
				.iter()
				.map(|result| (result.mount_id.as_str(), result.node.id.as_str()))
				.collect::<Vec<_>>(),
			vec![("m2", "e"), ("m1", "b"), ("m1", "c"), ("m1", "a"), ("m2", "d")]
		);
	}

	#[test]
	fn nothing_to_merge() {
		assert!(merge(Vec::new()).is_empty());
	}
}
