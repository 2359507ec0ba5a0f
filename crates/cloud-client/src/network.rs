use crate::ClientError;

use parking_lot::RwLock;

/// Which kinds of network path are currently usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkPath {
	/// Wi-Fi, ethernet and alike
	pub unmetered: bool,
	/// Cellular and other pay-per-byte links
	pub metered: bool,
}

impl NetworkPath {
	pub const OFFLINE: Self = Self {
		unmetered: false,
		metered: false,
	};
	pub const UNMETERED: Self = Self {
		unmetered: true,
		metered: false,
	};
	pub const METERED_ONLY: Self = Self {
		unmetered: false,
		metered: true,
	};
}

/// Reports the platform's current network path
pub trait PathMonitor: Send + Sync + 'static {
	fn current_path(&self) -> NetworkPath;
}

/// For platforms without metered links worth caring about
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeUnmetered;

impl PathMonitor for AssumeUnmetered {
	fn current_path(&self) -> NetworkPath {
		NetworkPath::UNMETERED
	}
}

/// A path monitor fed from the outside, e.g. by platform reachability callbacks
#[derive(Debug, Default)]
pub struct ManualPathMonitor {
	path: RwLock<NetworkPath>,
}

impl ManualPathMonitor {
	#[must_use]
	pub fn new(path: NetworkPath) -> Self {
		Self {
			path: RwLock::new(path),
		}
	}

	pub fn set(&self, path: NetworkPath) {
		*self.path.write() = path;
	}
}

impl PathMonitor for ManualPathMonitor {
	fn current_path(&self) -> NetworkPath {
		*self.path.read()
	}
}

/// Decides whether a request may go out over `path`; never asks anyone for consent
pub(crate) const fn admit(path: NetworkPath, allow_metered: bool) -> Result<(), ClientError> {
	if path.unmetered || (path.metered && allow_metered) {
		Ok(())
	} else if path.metered {
		Err(ClientError::InterfaceNotAllowed)
	} else {
		Err(ClientError::OfflineOrUnreachable)
	}
}
