//!
//! # Cloud API
//!
//! Typed operations against the Nimbus storage API. Every operation has the same shape: build an
//! [`ApiRequest`], hand it to the [`RequestDispatcher`], decode the payload or propagate the
//! classified [`ClientError`]. Nothing here retries.
//!
//! Operations live in one module per resource and take a [`CloudApi`] handle:
//!
//! ```no_run
//! # async fn example(api: nb_cloud_api::CloudApi) -> Result<(), nb_cloud_client::ClientError> {
//! let mounts = nb_cloud_api::mount::list(&api).await?;
//! for mount in mounts {
//! 	let children = nb_cloud_api::node::list(&api, &mount.root_node_id).await?;
//! 	println!("{}: {} entries", mount.name, children.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use nb_cloud_client::{
	ApiRequest, ApiResponse, CancellationToken, ClientError, RequestDispatcher, SessionManager,
};
use nb_disk_cache::DiskCache;

use std::{borrow::Cow, sync::Arc};

use serde::de::DeserializeOwned;

pub mod auth;
pub mod blob;
pub mod bookmark;
mod error;
pub mod link;
pub mod mount;
pub mod node;
pub mod search;
pub mod share;
pub mod types;
pub mod user;

pub use error::BlobError;
pub use types::*;

/// Entry point for every remote operation.
///
/// Cheap to clone. Handles made with [`CloudApi::scoped`] tie all their requests to a parent
/// cancellation token, so a UI flow can cancel everything it started, and nothing else, by
/// cancelling its scope.
#[derive(Debug, Clone)]
pub struct CloudApi {
	dispatcher: RequestDispatcher,
	cache: Arc<DiskCache>,
	scope: Option<CancellationToken>,
}

impl CloudApi {
	#[must_use]
	pub fn new(session: Arc<SessionManager>, cache: Arc<DiskCache>) -> Self {
		Self {
			dispatcher: RequestDispatcher::new(session),
			cache,
			scope: None,
		}
	}

	#[must_use]
	pub fn scoped(&self, scope: &CancellationToken) -> Self {
		Self {
			scope: Some(scope.clone()),
			..self.clone()
		}
	}

	#[must_use]
	pub const fn session(&self) -> &Arc<SessionManager> {
		self.dispatcher.session()
	}

	#[must_use]
	pub fn cache(&self) -> &DiskCache {
		&self.cache
	}

	pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
		let request = match &self.scope {
			Some(scope) => request.cancel_with(scope),
			None => request,
		};

		self.dispatcher.send(request).await
	}

	pub(crate) async fn fetch<T: DeserializeOwned>(
		&self,
		request: ApiRequest,
	) -> Result<T, ClientError> {
		self.send(request).await?.json()
	}
}

/// Percent-encodes an identifier for use as a single path segment
pub(crate) fn segment(id: &str) -> Cow<'_, str> {
	urlencoding::encode(id)
}
