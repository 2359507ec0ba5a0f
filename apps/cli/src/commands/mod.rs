use crate::context::Context;

use anyhow::Result;
use clap::{Subcommand, ValueEnum};

mod account;
mod cache;
mod files;
mod sharing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
	On,
	Off,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Log in and make the account active
	Login {
		username: String,
		/// Password, read from NIMBUS_PASSWORD when omitted
		#[arg(long, env = "NIMBUS_PASSWORD", hide_env_values = true)]
		password: String,
	},
	/// Log the active account out and forget its credential
	Logout,
	/// List accounts with a stored credential
	Accounts,
	/// Switch to another stored account
	Use { identity: String },
	/// Show the active user
	Whoami,
	/// Renew the active credential
	Refresh,
	/// Allow or forbid metered (cellular) networks
	Cellular {
		#[arg(value_enum)]
		state: Toggle,
	},
	/// List mounts
	Mounts,
	/// List the children of a directory
	Ls { node_id: String },
	/// Show a node
	Info { node_id: String },
	/// Create a directory
	Mkdir { parent_id: String, name: String },
	/// Rename a node
	Rename { node_id: String, name: String },
	/// Move a node into another directory
	Mv { node_id: String, destination_id: String },
	/// Copy a node into another directory
	Cp { node_id: String, destination_id: String },
	/// Delete a node
	Rm { node_id: String },
	/// Search every mount
	Search { query: String },
	/// List bookmarked nodes
	Bookmarks,
	/// Bookmark a node
	Bookmark {
		node_id: String,
		/// Remove the bookmark instead
		#[arg(long, default_value_t = false)]
		clear: bool,
	},
	/// Share a node with other users
	Share {
		node_id: String,
		#[arg(required = true)]
		recipients: Vec<String>,
		/// Let recipients modify the node
		#[arg(long, default_value_t = false)]
		write: bool,
	},
	/// Create a public download link
	Link {
		node_id: String,
		#[arg(long)]
		expires_in_days: Option<u32>,
	},
	/// Download a file
	Download {
		node_id: String,
		dest: std::path::PathBuf,
	},
	/// Download a user's profile image
	Avatar {
		user_id: String,
		dest: std::path::PathBuf,
	},
	/// Inspect or clear the local cache
	#[command(subcommand)]
	Cache(cache::CacheCommands),
}

pub async fn run(ctx: &mut Context, command: Commands) -> Result<()> {
	match command {
		Commands::Login { username, password } => account::login(ctx, &username, &password).await,
		Commands::Logout => account::logout(ctx).await,
		Commands::Accounts => account::accounts(ctx).await,
		Commands::Use { identity } => account::switch(ctx, identity.into()).await,
		Commands::Whoami => account::whoami(ctx).await,
		Commands::Refresh => account::refresh(ctx).await,
		Commands::Cellular { state } => account::cellular(ctx, state == Toggle::On),
		Commands::Mounts => files::mounts(ctx).await,
		Commands::Ls { node_id } => files::ls(ctx, &node_id).await,
		Commands::Info { node_id } => files::info(ctx, &node_id).await,
		Commands::Mkdir { parent_id, name } => files::mkdir(ctx, &parent_id, &name).await,
		Commands::Rename { node_id, name } => files::rename(ctx, &node_id, &name).await,
		Commands::Mv {
			node_id,
			destination_id,
		} => files::mv(ctx, &node_id, &destination_id).await,
		Commands::Cp {
			node_id,
			destination_id,
		} => files::cp(ctx, &node_id, &destination_id).await,
		Commands::Rm { node_id } => files::rm(ctx, &node_id).await,
		Commands::Search { query } => files::search(ctx, &query).await,
		Commands::Bookmarks => files::bookmarks(ctx).await,
		Commands::Bookmark { node_id, clear } => files::bookmark(ctx, &node_id, clear).await,
		Commands::Share {
			node_id,
			recipients,
			write,
		} => sharing::share(ctx, &node_id, &recipients, write).await,
		Commands::Link {
			node_id,
			expires_in_days,
		} => sharing::link(ctx, &node_id, expires_in_days).await,
		Commands::Download { node_id, dest } => files::download(ctx, &node_id, &dest).await,
		Commands::Avatar { user_id, dest } => files::avatar(ctx, user_id.into(), &dest).await,
		Commands::Cache(command) => cache::run(ctx, command).await,
	}
}
