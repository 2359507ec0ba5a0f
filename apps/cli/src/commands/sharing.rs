use crate::context::Context;

use nb_cloud_api::{link, share, SharePermission};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};

pub async fn share(
	ctx: &mut Context,
	node_id: &str,
	recipients: &[String],
	write: bool,
) -> Result<()> {
	let permission = if write {
		SharePermission::Write
	} else {
		SharePermission::Read
	};

	let shares = share::create(&ctx.api, node_id, recipients, permission).await?;

	ctx.emit(shares.as_slice(), |shares| {
		for share in shares {
			println!(
				"Shared {} with {} ({:?})",
				share.node_id, share.recipient, share.permission
			);
		}
	})
}

pub async fn link(ctx: &mut Context, node_id: &str, expires_in_days: Option<u32>) -> Result<()> {
	let expires_at = expires_in_days
		.map(|days| expiry_after(Utc::now(), days))
		.transpose()?;

	let link = link::download::create(&ctx.api, node_id, expires_at, None).await?;

	ctx.emit(&link, |link| match link.expires_at {
		Some(expires_at) => println!("{} (expires {})", link.url, expires_at.format("%Y-%m-%d")),
		None => println!("{}", link.url),
	})
}

fn expiry_after(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
	now.checked_add_signed(Duration::days(i64::from(days)))
		.ok_or_else(|| anyhow!("An expiry {days} days from now is out of range"))
}

#[cfg(test)]
mod tests {
	use super::*;

	use chrono::TimeZone;

	#[test]
	fn expiry_is_counted_in_days() {
		let now = Utc.with_ymd_and_hms(2024, 2, 27, 12, 0, 0).unwrap();

		assert_eq!(
			expiry_after(now, 3).unwrap(),
			Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
		);
	}

	#[test]
	fn unreachable_expiry_is_an_error() {
		let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

		assert!(expiry_after(now, u32::MAX).is_err());
	}
}
