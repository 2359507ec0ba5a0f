use crate::context::{format_bytes, Context};

use nb_disk_cache::CacheCategory;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
	/// Show how much disk the cache uses
	Size,
	/// Delete cached data; both categories unless one is picked
	Clear {
		#[arg(long, conflicts_with = "files")]
		profile_images: bool,
		#[arg(long)]
		files: bool,
	},
}

pub async fn run(ctx: &mut Context, command: CacheCommands) -> Result<()> {
	match command {
		CacheCommands::Size => size(ctx).await,
		CacheCommands::Clear {
			profile_images,
			files,
		} => {
			let categories = match (profile_images, files) {
				(true, _) => vec![CacheCategory::ProfileImage],
				(_, true) => vec![CacheCategory::FileBlob],
				_ => CacheCategory::ALL.to_vec(),
			};

			for category in categories {
				ctx.api.cache().clear(category, None).await?;
				println!("Cleared {category}");
			}

			Ok(())
		}
	}
}

async fn size(ctx: &mut Context) -> Result<()> {
	let cache = ctx.api.cache();
	let profile_images = cache.size_of(CacheCategory::ProfileImage).await?;
	let files = cache.size_of(CacheCategory::FileBlob).await?;

	ctx.emit(
		&json!({ "profileImages": profile_images, "files": files }),
		|_| {
			println!("profile images  {}", format_bytes(profile_images));
			println!("files           {}", format_bytes(files));
		},
	)
}
