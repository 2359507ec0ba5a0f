//!
//! # Cloud Client
//!
//! The session-authenticated network layer of Nimbus.
//!
//! - [`SessionManager`] owns the single active [`Session`]: which [`Identity`] is logged in, its
//!   [`Credential`], the metered-network policy and the transport bound to all of it.
//! - [`RequestDispatcher`] turns an [`ApiRequest`] into exactly one transport attempt, racing it
//!   against the request's own cancellation and the session's teardown.
//! - [`classify`] reduces every non-success into one [`ClientError`], the closed taxonomy every
//!   caller handles.
//! - [`CredentialVault`] is where credentials live between runs.
//!
//! Nothing here retries. Callers decide what to re-issue, guided by
//! [`ClientError::is_transient`].

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

pub mod classify;
mod config;
mod dispatcher;
mod error;
mod identity;
pub mod join;
mod network;
mod request;
mod session;
pub mod transport;
pub mod vault;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use config::ClientConfig;
pub use dispatcher::RequestDispatcher;
pub use error::{ClientError, SessionError, TransportBuildError, VaultError};
pub use identity::{Credential, Identity};
pub use network::{AssumeUnmetered, ManualPathMonitor, NetworkPath, PathMonitor};
pub use request::{ApiRequest, ApiResponse};
pub use session::{Session, SessionManager, SessionStatus};
pub use vault::{CredentialVault, KeyringVault, MemoryVault};

pub use tokio_util::sync::CancellationToken;
