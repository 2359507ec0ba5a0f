//! Wire types of the storage API.

use nb_cloud_client::Identity;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: Identity,
	pub username: String,
	#[serde(default)]
	pub display_name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

impl User {
	#[must_use]
	pub fn display_name(&self) -> &str {
		self.display_name.as_deref().unwrap_or(&self.username)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MountKind {
	/// The user's own storage
	Personal,
	/// Storage someone else shared with the user
	Shared,
	/// Storage of a group the user belongs to
	Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
	pub used: u64,
	pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mount {
	pub id: String,
	pub name: String,
	pub kind: MountKind,
	pub root_node_id: String,
	#[serde(default)]
	pub quota: Option<Quota>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
	Directory,
	File,
}

/// A file or directory inside a mount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
	pub id: String,
	pub name: String,
	pub kind: NodeKind,
	pub mount_id: String,
	#[serde(default)]
	pub parent_id: Option<String>,
	#[serde(default)]
	pub size: Option<u64>,
	/// Digest of the file content as computed by the server; directories have none
	#[serde(default)]
	pub content_hash: Option<String>,
	#[serde(default)]
	pub mime_type: Option<String>,
	pub modified_at: DateTime<Utc>,
	#[serde(default)]
	pub bookmarked: bool,
}

impl Node {
	#[must_use]
	pub const fn is_directory(&self) -> bool {
		matches!(self.kind, NodeKind::Directory)
	}

	#[must_use]
	pub fn extension(&self) -> Option<&str> {
		Path::new(&self.name).extension().and_then(|ext| ext.to_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SharePermission {
	Read,
	Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
	pub id: String,
	pub node_id: String,
	/// Username of whoever the node is shared with
	pub recipient: String,
	pub permission: SharePermission,
	pub created_at: DateTime<Utc>,
}

/// Public link anyone can download a node through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
	pub id: String,
	pub node_id: String,
	pub url: String,
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
	#[serde(default)]
	pub download_count: u64,
	#[serde(default)]
	pub password_protected: bool,
}

/// Public link anyone can upload into a directory through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadLink {
	pub id: String,
	pub node_id: String,
	pub url: String,
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
	pub node: Node,
	/// Relevance as reported by the server, higher is better
	pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountSearchResults {
	pub mount_id: String,
	#[serde(default)]
	pub hits: Vec<SearchHit>,
}
