use crate::{
	key::{entry_name, EntryName},
	CacheCategory, CacheError,
};

use nb_utils::error::FileIOError;

use std::{
	io,
	path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

/// Content-addressed blob store rooted at a single directory
#[derive(Debug, Clone)]
pub struct DiskCache {
	root: PathBuf,
}

impl DiskCache {
	/// Opens (and creates, if needed) a cache rooted at `root`
	pub async fn new(root: impl AsRef<Path> + Send) -> Result<Self, CacheError> {
		let root = root.as_ref().to_path_buf();

		for category in CacheCategory::ALL {
			let dir = root.join(category.dir_name());
			fs::create_dir_all(&dir).await.map_err(|e| {
				FileIOError::from((&dir, e, "Failed to create cache category directory"))
			})?;
		}

		Ok(Self { root })
	}

	#[must_use]
	pub fn root(&self) -> &Path {
		&self.root
	}

	#[must_use]
	pub fn category_dir(&self, category: CacheCategory) -> PathBuf {
		self.root.join(category.dir_name())
	}

	/// Where the entry for `key` lives (or would live) on disk
	pub fn path_for(&self, category: CacheCategory, key: &str) -> Result<PathBuf, CacheError> {
		let EntryName { shard, file_name } = entry_name(key)?;

		Ok(self.category_dir(category).join(shard).join(file_name))
	}

	/// Reads an entry; a missing entry is `Ok(None)`, not an error
	#[instrument(skip(self), err)]
	pub async fn load(
		&self,
		category: CacheCategory,
		key: &str,
	) -> Result<Option<Vec<u8>>, CacheError> {
		let path = self.path_for(category, key)?;

		match fs::read(&path).await {
			Ok(bytes) => {
				trace!(len = bytes.len(), "cache hit");
				Ok(Some(bytes))
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				trace!("cache miss");
				Ok(None)
			}
			Err(e) => Err(FileIOError::from((path, e, "Failed to read cache entry")).into()),
		}
	}

	pub async fn contains(&self, category: CacheCategory, key: &str) -> Result<bool, CacheError> {
		let path = self.path_for(category, key)?;

		fs::try_exists(&path)
			.await
			.map_err(|e| FileIOError::from((path, e, "Failed to check cache entry")).into())
	}

	/// Writes an entry, replacing any previous content under the same key.
	///
	/// The bytes are written to a temporary file next to the final location and renamed into
	/// place, so concurrent readers see either the old entry, the new one, or nothing.
	#[instrument(skip(self, bytes), fields(len = bytes.len()), err)]
	pub async fn store(
		&self,
		category: CacheCategory,
		key: &str,
		bytes: &[u8],
	) -> Result<(), CacheError> {
		let EntryName { shard, file_name } = entry_name(key)?;

		let shard_dir = self.category_dir(category).join(shard);
		fs::create_dir_all(&shard_dir)
			.await
			.map_err(|e| FileIOError::from((&shard_dir, e, "Failed to create cache shard")))?;

		let path = shard_dir.join(&file_name);
		let temp_path = shard_dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

		if let Err(e) = write_durably(&temp_path, bytes).await {
			fs::remove_file(&temp_path).await.ok();
			return Err(e.into());
		}

		if let Err(e) = fs::rename(&temp_path, &path).await {
			fs::remove_file(&temp_path).await.ok();
			return Err(
				FileIOError::from((path, e, "Failed to move cache entry into place")).into(),
			);
		}

		debug!("stored cache entry");

		Ok(())
	}

	/// Removes a single entry, or the whole category when `key` is `None`
	#[instrument(skip(self), err)]
	pub async fn clear(
		&self,
		category: CacheCategory,
		key: Option<&str>,
	) -> Result<(), CacheError> {
		if let Some(key) = key {
			let path = self.path_for(category, key)?;

			return match fs::remove_file(&path).await {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
				Err(e) => {
					Err(FileIOError::from((path, e, "Failed to remove cache entry")).into())
				}
			};
		}

		let dir = self.category_dir(category);
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
			Err(e) => {
				return Err(FileIOError::from((dir, e, "Failed to read cache category")).into())
			}
		};

		let mut removed = 0_usize;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| FileIOError::from((&dir, e, "Failed to read cache category")))?
		{
			let path = entry.path();
			let res = if entry
				.file_type()
				.await
				.map_err(|e| FileIOError::from((&path, e)))?
				.is_dir()
			{
				fs::remove_dir_all(&path).await
			} else {
				fs::remove_file(&path).await
			};

			match res {
				Ok(()) => removed += 1,
				Err(e) if e.kind() == io::ErrorKind::NotFound => {}
				Err(e) => {
					return Err(FileIOError::from((path, e, "Failed to clear cache shard")).into())
				}
			}
		}

		debug!(%removed, "cleared cache category");

		Ok(())
	}

	/// Sum of the on-disk sizes of every entry in `category`, for display only
	pub async fn size_of(&self, category: CacheCategory) -> Result<u64, CacheError> {
		let dir = self.category_dir(category);
		let mut total = 0;

		let mut shards = match fs::read_dir(&dir).await {
			Ok(shards) => shards,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
			Err(e) => {
				return Err(FileIOError::from((dir, e, "Failed to read cache category")).into())
			}
		};

		while let Some(shard) = shards
			.next_entry()
			.await
			.map_err(|e| FileIOError::from((&dir, e, "Failed to read cache category")))?
		{
			let shard_path = shard.path();
			let is_dir = shard
				.file_type()
				.await
				.map_err(|e| FileIOError::from((&shard_path, e)))?
				.is_dir();
			if !is_dir {
				continue;
			}

			let mut entries = match fs::read_dir(&shard_path).await {
				Ok(entries) => entries,
				// Cleared under our feet
				Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
				Err(e) => {
					return Err(FileIOError::from((shard_path, e, "Failed to read cache shard"))
						.into())
				}
			};

			while let Some(entry) = entries
				.next_entry()
				.await
				.map_err(|e| FileIOError::from((&shard_path, e, "Failed to read cache shard")))?
			{
				if is_in_flight(&entry.file_name()) {
					continue;
				}

				match entry.metadata().await {
					Ok(metadata) if metadata.is_file() => total += metadata.len(),
					Ok(_) => {}
					Err(e) if e.kind() == io::ErrorKind::NotFound => {}
					Err(e) => return Err(FileIOError::from((entry.path(), e)).into()),
				}
			}
		}

		Ok(total)
	}
}

/// Temporary files are dot-prefixed; entry names are hex digests and never are
fn is_in_flight(file_name: &std::ffi::OsStr) -> bool {
	file_name
		.to_str()
		.map_or(true, |name| name.starts_with('.'))
}

async fn write_durably(path: &Path, bytes: &[u8]) -> Result<(), FileIOError> {
	let mut file = fs::File::create(path)
		.await
		.map_err(|e| FileIOError::from((path, e, "Failed to create temporary cache file")))?;

	file.write_all(bytes)
		.await
		.map_err(|e| FileIOError::from((path, e, "Failed to write temporary cache file")))?;

	file.sync_all()
		.await
		.map_err(|e| FileIOError::from((path, e, "Failed to sync temporary cache file")))
}
