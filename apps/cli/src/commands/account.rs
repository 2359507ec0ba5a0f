use crate::context::Context;

use nb_cloud_api::{auth, user};
use nb_cloud_client::Identity;

use anyhow::{bail, Result};
use tracing::info;

pub async fn login(ctx: &mut Context, username: &str, password: &str) -> Result<()> {
	let identity = ctx.session().authenticate(username, password).await?;
	ctx.config
		.set_last_identity(Some(identity.clone()), &ctx.data_dir)?;

	println!("Logged in as {identity}");

	Ok(())
}

pub async fn logout(ctx: &mut Context) -> Result<()> {
	let Some(identity) = ctx.session().active_identity() else {
		bail!("Not logged in");
	};

	ctx.session().revoke(identity.clone()).await?;
	ctx.config.set_last_identity(None, &ctx.data_dir)?;

	println!("Logged out {identity}");

	Ok(())
}

pub async fn accounts(ctx: &mut Context) -> Result<()> {
	let identities = ctx.session().known_identities().await?;
	let active = ctx.session().active_identity();

	ctx.emit(&identities, |identities| {
		if identities.is_empty() {
			println!("No stored accounts, run `nimbus login <username>`");
		}
		for identity in identities {
			let marker = if active.as_ref() == Some(identity) { "*" } else { " " };
			println!("{marker} {identity}");
		}
	})
}

pub async fn switch(ctx: &mut Context, identity: Identity) -> Result<()> {
	ctx.session().activate(identity.clone()).await?;
	ctx.config
		.set_last_identity(Some(identity.clone()), &ctx.data_dir)?;

	info!(%identity, "Switched account");
	println!("Now using {identity}");

	Ok(())
}

pub async fn whoami(ctx: &mut Context) -> Result<()> {
	let me = user::me(&ctx.api).await?;

	ctx.emit(&me, |me| match &me.email {
		Some(email) => println!("{} <{email}> ({})", me.display_name(), me.id),
		None => println!("{} ({})", me.display_name(), me.id),
	})
}

pub async fn refresh(ctx: &mut Context) -> Result<()> {
	auth::refresh(&ctx.api).await?;

	println!("Credential renewed");

	Ok(())
}

pub fn cellular(ctx: &mut Context, allowed: bool) -> Result<()> {
	ctx.session().set_cellular_allowed(allowed)?;
	ctx.config.set_allow_metered(allowed, &ctx.data_dir)?;

	println!(
		"Metered networks are now {}",
		if allowed { "allowed" } else { "not allowed" }
	);

	Ok(())
}
