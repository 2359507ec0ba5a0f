//!
//! # Disk Cache
//!
//! Content-addressed byte-blob storage for the things Nimbus downloads more than once: profile
//! images and file contents. Each [`CacheCategory`] lives in its own directory, so clearing one
//! never touches the other.
//!
//! ```text
//! <cache_dir>/
//! ├── profile-images/
//! │   └── <blake3(key)>[0..2]/   # sharding
//! │       └── <blake3(key)>.<ext>
//! └── files/
//!     └── <blake3(key)>[0..2]/
//!         └── <blake3(key)>.<ext>
//! ```
//!
//! Writes are atomic: bytes land in a temporary file inside the shard directory and are renamed
//! into place, so a reader never observes a partial entry. Concurrent writes to the same key are
//! last-write-wins; keys are content or identity addressed, so colliding writers carry the same
//! intended content.
//!
//! There is no eviction. Entries only go away through [`DiskCache::clear`], and
//! [`DiskCache::size_of`] exists for display purposes only.
//!
//! ```no_run
//! use nb_disk_cache::{CacheCategory, DiskCache};
//!
//! # async fn example() -> Result<(), nb_disk_cache::CacheError> {
//! let cache = DiskCache::new("/tmp/nimbus-cache").await?;
//!
//! cache.store(CacheCategory::ProfileImage, "u1.png", b"png bytes").await?;
//! assert_eq!(
//! 	cache.load(CacheCategory::ProfileImage, "u1.png").await?.as_deref(),
//! 	Some(&b"png bytes"[..])
//! );
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

mod cache;
mod category;
mod error;
mod key;

pub use cache::DiskCache;
pub use category::CacheCategory;
pub use error::CacheError;
