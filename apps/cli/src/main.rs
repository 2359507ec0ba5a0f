use nb_cloud_api::{BlobError, CloudApi};
use nb_cloud_client::{
	transport::ReqwestTransportFactory, CancellationToken, ClientError, KeyringVault,
	ManualPathMonitor, NetworkPath, SessionError, SessionManager,
};
use nb_disk_cache::DiskCache;
use nb_utils::report_error;

use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use tokio::time::timeout;
use tracing::{debug, warn};

mod commands;
mod config;
mod context;
mod logging;

use commands::Commands;
use config::CliConfig;
use context::{Context, OutputFormat};

/// Keychain service every credential is stored under
const KEYCHAIN_SERVICE: &str = "nimbus";

/// Longest the exit waits on background server calls such as revocations
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "nimbus", version, about = "Nimbus cloud storage client")]
struct Cli {
	/// Path to the nimbus data directory
	#[arg(long, global = true)]
	data_dir: Option<PathBuf>,

	/// Base URL of the storage API, overriding the configured one for this run
	#[arg(long, global = true)]
	api_url: Option<String>,

	/// Treat the current network as metered (cellular)
	#[arg(long, global = true, default_value_t = false)]
	metered: bool,

	/// Output format
	#[arg(long, global = true, value_enum, default_value = "human")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

fn default_data_dir() -> Result<PathBuf> {
	directories::ProjectDirs::from("", "", "Nimbus")
		.map(|dirs| dirs.data_dir().to_path_buf())
		.ok_or_else(|| anyhow!("No home directory to keep nimbus data in, pass --data-dir"))
}

async fn bootstrap(cli: &Cli, data_dir: PathBuf) -> Result<Context> {
	let mut config = CliConfig::load(&data_dir)?;
	let mut client = config.client.clone();
	if let Some(api_url) = &cli.api_url {
		client.api_url.clone_from(api_url);
	}

	let monitor = ManualPathMonitor::new(if cli.metered {
		NetworkPath::METERED_ONLY
	} else {
		NetworkPath::UNMETERED
	});

	let session = Arc::new(SessionManager::new(
		client,
		Arc::new(KeyringVault::new(KEYCHAIN_SERVICE)),
		Arc::new(ReqwestTransportFactory),
		Arc::new(monitor),
		config.allow_metered,
	)?);

	if let Some(identity) = config.last_identity.clone() {
		match session.activate(identity.clone()).await {
			Ok(()) => debug!(%identity, "Resumed session"),
			Err(SessionError::NoStoredCredential(_)) => {
				warn!(%identity, "Stored credential is gone, forgetting the account;");
				config.set_last_identity(None, &data_dir)?;
			}
			Err(e) => return Err(e).context("Failed to resume the last session"),
		}
	}

	let cache = DiskCache::new(data_dir.join("cache")).await?;

	// Ctrl-C cancels whatever the command has in flight
	let scope = CancellationToken::new();
	tokio::spawn({
		let scope = scope.clone();
		async move {
			let res = tokio::signal::ctrl_c().await;
			report_error(&res, "Failed to listen for Ctrl-C;");
			if res.is_ok() {
				scope.cancel();
			}
		}
	});

	Ok(Context {
		api: CloudApi::new(session, Arc::new(cache)).scoped(&scope),
		config,
		format: cli.format,
		data_dir,
	})
}

async fn flush(ctx: &Context) {
	if timeout(FLUSH_TIMEOUT, ctx.session().flush()).await.is_err() {
		warn!("Gave up waiting for background server calls;");
	}
}

/// The classified client error behind `e`, if any
fn client_error(e: &anyhow::Error) -> Option<&ClientError> {
	e.chain().find_map(|cause| {
		cause
			.downcast_ref::<ClientError>()
			.or_else(|| match cause.downcast_ref::<SessionError>() {
				Some(SessionError::Client(e)) => Some(e),
				_ => None,
			})
			.or_else(|| match cause.downcast_ref::<BlobError>() {
				Some(BlobError::Client(e)) => Some(e),
				_ => None,
			})
	})
}

fn report(e: &anyhow::Error) {
	let hint = match client_error(e) {
		Some(ClientError::Cancelled) => {
			eprintln!("Cancelled");
			return;
		}
		Some(ClientError::InterfaceNotAllowed) => {
			Some("only a metered network is available, allow it with `nimbus cellular on`")
		}
		Some(ClientError::Unauthenticated | ClientError::SessionExpired) => {
			Some("log in with `nimbus login <username>`")
		}
		Some(e) if e.is_transient() => Some("check your connection and try again"),
		_ => None,
	};

	eprintln!("Error: {e:#}");
	if let Some(hint) = hint {
		eprintln!("Hint: {hint}");
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();

	let data_dir = match cli.data_dir.clone().map_or_else(default_data_dir, Ok) {
		Ok(data_dir) => data_dir,
		Err(e) => {
			report(&e);
			return ExitCode::FAILURE;
		}
	};

	let _guard = match logging::init(&data_dir) {
		Ok(guard) => guard,
		Err(e) => {
			report(&e.context("Failed to initialize logging"));
			return ExitCode::FAILURE;
		}
	};

	let res = match bootstrap(&cli, data_dir).await {
		Ok(mut ctx) => {
			let res = commands::run(&mut ctx, cli.command).await;
			flush(&ctx).await;
			res
		}
		Err(e) => Err(e),
	};

	match res {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			report(&e);
			ExitCode::FAILURE
		}
	}
}
