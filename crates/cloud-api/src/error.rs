use nb_cloud_client::ClientError;
use nb_disk_cache::CacheError;

use thiserror::Error;

/// Failure of an operation that goes through both the network and the disk cache
#[derive(Debug, Error)]
pub enum BlobError {
	#[error(transparent)]
	Client(#[from] ClientError),
	#[error(transparent)]
	Cache(#[from] CacheError),
}
