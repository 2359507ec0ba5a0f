use nb_utils::error::FileIOError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
	#[error("invalid cache key: {0:?}")]
	InvalidKey(String),

	#[error(transparent)]
	FileIO(#[from] FileIOError),
}
