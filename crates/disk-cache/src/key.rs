use crate::CacheError;

use std::path::Path;

const MAX_EXTENSION_LEN: usize = 10;
const SHARD_LEN: usize = 2;

const TEMP_SUFFIX: &str = "tmp";

/// Location of a cache entry relative to its category directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryName {
	pub shard: String,
	pub file_name: String,
}

/// Maps a caller supplied key to a deterministic, collision free file name.
///
/// The file stem is the blake3 digest of the whole key, so distinct keys never share a file;
/// the key's extension is kept (when it is short and alphanumeric) for the benefit of anyone
/// browsing the cache directory.
pub(crate) fn entry_name(key: &str) -> Result<EntryName, CacheError> {
	if key.is_empty() {
		return Err(CacheError::InvalidKey(key.to_string()));
	}

	let digest = blake3::hash(key.as_bytes()).to_hex().to_string();
	let shard = digest[..SHARD_LEN].to_string();

	let file_name = match extension(key) {
		Some(ext) => format!("{digest}.{ext}"),
		None => digest,
	};

	Ok(EntryName { shard, file_name })
}

fn extension(key: &str) -> Option<String> {
	Path::new(key)
		.extension()
		.and_then(|ext| ext.to_str())
		.filter(|ext| {
			!ext.is_empty()
				&& ext.len() <= MAX_EXTENSION_LEN
				&& ext.chars().all(|c| c.is_ascii_alphanumeric())
				// Never let a key produce something that looks like an in-flight write
				&& !ext.eq_ignore_ascii_case(TEMP_SUFFIX)
		})
		.map(str::to_ascii_lowercase)
}
