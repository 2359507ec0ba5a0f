use crate::context::{format_bytes, Context};

use nb_cloud_api::{blob, bookmark, mount, node, search, Node};
use nb_cloud_client::Identity;

use std::path::Path;

use anyhow::{bail, Context as _, Result};

fn print_node(node: &Node) {
	let kind = if node.is_directory() { "d" } else { "-" };
	let size = node.size.map_or_else(|| "-".to_string(), format_bytes);
	let bookmark = if node.bookmarked { "*" } else { " " };

	println!(
		"{kind}{bookmark} {size:>10}  {}  {}  {}",
		node.modified_at.format("%Y-%m-%d %H:%M"),
		node.id,
		node.name
	);
}

fn print_nodes(nodes: &[Node]) {
	for node in nodes {
		print_node(node);
	}
}

pub async fn mounts(ctx: &mut Context) -> Result<()> {
	let mounts = mount::list(&ctx.api).await?;

	ctx.emit(&mounts, |mounts| {
		for mount in mounts {
			let usage = mount.quota.map_or_else(String::new, |quota| {
				format!(
					"  {} of {}",
					format_bytes(quota.used),
					format_bytes(quota.total)
				)
			});
			println!(
				"{}  {} ({:?}, root {}){usage}",
				mount.id, mount.name, mount.kind, mount.root_node_id
			);
		}
	})
}

pub async fn ls(ctx: &mut Context, node_id: &str) -> Result<()> {
	let children = node::list(&ctx.api, node_id).await?;

	ctx.emit(children.as_slice(), print_nodes)
}

pub async fn info(ctx: &mut Context, node_id: &str) -> Result<()> {
	let node = node::get(&ctx.api, node_id).await?;

	ctx.emit(&node, |node| {
		print_node(node);
		if let Some(mime_type) = &node.mime_type {
			println!("type: {mime_type}");
		}
		if let Some(hash) = &node.content_hash {
			println!("content hash: {hash}");
		}
	})
}

pub async fn mkdir(ctx: &mut Context, parent_id: &str, name: &str) -> Result<()> {
	let folder = node::create_folder(&ctx.api, parent_id, name).await?;

	ctx.emit(&folder, print_node)
}

pub async fn rename(ctx: &mut Context, node_id: &str, name: &str) -> Result<()> {
	let node = node::rename(&ctx.api, node_id, name).await?;

	ctx.emit(&node, print_node)
}

pub async fn mv(ctx: &mut Context, node_id: &str, destination_id: &str) -> Result<()> {
	let node = node::move_to(&ctx.api, node_id, destination_id).await?;

	ctx.emit(&node, print_node)
}

pub async fn cp(ctx: &mut Context, node_id: &str, destination_id: &str) -> Result<()> {
	let node = node::copy_to(&ctx.api, node_id, destination_id).await?;

	ctx.emit(&node, print_node)
}

pub async fn rm(ctx: &mut Context, node_id: &str) -> Result<()> {
	node::delete(&ctx.api, node_id).await?;

	println!("Deleted {node_id}");

	Ok(())
}

pub async fn search(ctx: &mut Context, query: &str) -> Result<()> {
	let results = search::across_mounts(&ctx.api, query).await?;
	let nodes = results
		.into_iter()
		.map(|result| result.node)
		.collect::<Vec<_>>();

	ctx.emit(nodes.as_slice(), |nodes| {
		if nodes.is_empty() {
			println!("Nothing matches '{query}'");
		}
		print_nodes(nodes);
	})
}

pub async fn bookmarks(ctx: &mut Context) -> Result<()> {
	let nodes = bookmark::list(&ctx.api).await?;

	ctx.emit(nodes.as_slice(), print_nodes)
}

pub async fn bookmark(ctx: &mut Context, node_id: &str, clear: bool) -> Result<()> {
	if clear {
		bookmark::clear(&ctx.api, node_id).await?;
		println!("Removed bookmark from {node_id}");
	} else {
		bookmark::set(&ctx.api, node_id).await?;
		println!("Bookmarked {node_id}");
	}

	Ok(())
}

pub async fn download(ctx: &mut Context, node_id: &str, dest: &Path) -> Result<()> {
	let node = node::get(&ctx.api, node_id).await?;
	if node.is_directory() {
		bail!("'{}' is a directory", node.name);
	}

	let bytes = blob::download(&ctx.api, &node).await?;
	let dest = if dest.is_dir() {
		dest.join(&node.name)
	} else {
		dest.to_path_buf()
	};

	tokio::fs::write(&dest, &bytes)
		.await
		.with_context(|| format!("Failed to write {}", dest.display()))?;

	println!(
		"Saved {} ({}) to {}",
		node.name,
		format_bytes(bytes.len() as u64),
		dest.display()
	);

	Ok(())
}

pub async fn avatar(ctx: &mut Context, user_id: Identity, dest: &Path) -> Result<()> {
	let Some(bytes) = blob::profile_image(&ctx.api, &user_id).await? else {
		println!("{user_id} has no profile image");
		return Ok(());
	};

	tokio::fs::write(dest, &bytes)
		.await
		.with_context(|| format!("Failed to write {}", dest.display()))?;

	println!("Saved profile image of {user_id} to {}", dest.display());

	Ok(())
}
