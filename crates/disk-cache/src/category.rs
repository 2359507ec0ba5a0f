use std::fmt;

/// Independent namespaces of the disk cache, one directory each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
	/// User avatars, keyed by user id plus extension
	ProfileImage,
	/// Downloaded file contents, keyed by content hash plus extension
	FileBlob,
}

impl CacheCategory {
	pub const ALL: [Self; 2] = [Self::ProfileImage, Self::FileBlob];

	#[must_use]
	pub const fn dir_name(self) -> &'static str {
		match self {
			Self::ProfileImage => "profile-images",
			Self::FileBlob => "files",
		}
	}
}

impl fmt::Display for CacheCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.dir_name())
	}
}
