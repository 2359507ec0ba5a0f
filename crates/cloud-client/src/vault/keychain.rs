use super::CredentialVault;
use crate::{error::VaultError, Credential, Identity};

use std::collections::BTreeSet;

use async_trait::async_trait;
use keyring::Entry;
use tokio::{sync::Mutex, task::spawn_blocking};
use tracing::debug;

// Keychains cannot enumerate their entries, so the identities with a stored credential are
// tracked in an extra entry of their own
const IDENTITY_INDEX: &str = "nimbus.identities";

/// Vault backed by the OS keychain (Keychain on Apple platforms, Credential Manager on Windows,
/// the kernel keyring on Linux)
#[derive(Debug)]
pub struct KeyringVault {
	service: String,
	index_lock: Mutex<()>,
}

impl KeyringVault {
	pub fn new(service: impl Into<String>) -> Self {
		Self {
			service: service.into(),
			index_lock: Mutex::new(()),
		}
	}

	async fn blocking<T, F>(&self, op: F) -> Result<T, VaultError>
	where
		T: Send + 'static,
		F: FnOnce(&str) -> Result<T, VaultError> + Send + 'static,
	{
		let service = self.service.clone();

		spawn_blocking(move || op(&service))
			.await
			.map_err(|e| VaultError::Backend(format!("keychain task failed: {e}")))?
	}
}

#[async_trait]
impl CredentialVault for KeyringVault {
	async fn save(&self, credential: &Credential, identity: &Identity) -> Result<(), VaultError> {
		if identity.as_str() == IDENTITY_INDEX {
			return Err(VaultError::Backend(format!(
				"'{IDENTITY_INDEX}' is a reserved identity"
			)));
		}

		let secret = serde_json::to_string(credential)?;
		let user = identity.to_string();

		let _index = self.index_lock.lock().await;
		self.blocking(move |service| {
			write_entry(service, &user, &secret)?;

			let mut index = read_index(service)?;
			if index.insert(user) {
				write_index(service, &index)?;
			}

			Ok(())
		})
		.await?;

		debug!(%identity, "credential saved to keychain");

		Ok(())
	}

	async fn read(&self, identity: &Identity) -> Result<Option<Credential>, VaultError> {
		let user = identity.to_string();

		self.blocking(move |service| {
			read_entry(service, &user)?
				.map(|secret| serde_json::from_str::<Credential>(&secret).map_err(VaultError::from))
				.transpose()
		})
		.await
	}

	async fn delete(&self, identity: &Identity) -> Result<(), VaultError> {
		let user = identity.to_string();

		let _index = self.index_lock.lock().await;
		self.blocking(move |service| {
			delete_entry(service, &user)?;

			let mut index = read_index(service)?;
			if index.remove(&user) {
				write_index(service, &index)?;
			}

			Ok(())
		})
		.await?;

		debug!(%identity, "credential deleted from keychain");

		Ok(())
	}

	async fn list_identities(&self) -> Result<Vec<Identity>, VaultError> {
		self.blocking(|service| Ok(read_index(service)?.into_iter().map(Identity::from).collect()))
			.await
	}
}

fn backend(e: keyring::Error) -> VaultError {
	VaultError::Backend(e.to_string())
}

fn read_entry(service: &str, user: &str) -> Result<Option<String>, VaultError> {
	match Entry::new(service, user).map_err(backend)?.get_password() {
		Ok(secret) => Ok(Some(secret)),
		Err(keyring::Error::NoEntry) => Ok(None),
		Err(e) => Err(backend(e)),
	}
}

fn write_entry(service: &str, user: &str, secret: &str) -> Result<(), VaultError> {
	Entry::new(service, user)
		.and_then(|entry| entry.set_password(secret))
		.map_err(backend)
}

fn delete_entry(service: &str, user: &str) -> Result<(), VaultError> {
	match Entry::new(service, user).map_err(backend)?.delete_credential() {
		Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
		Err(e) => Err(backend(e)),
	}
}

fn read_index(service: &str) -> Result<BTreeSet<String>, VaultError> {
	match read_entry(service, IDENTITY_INDEX)? {
		Some(raw) => Ok(serde_json::from_str(&raw)?),
		None => Ok(BTreeSet::new()),
	}
}

fn write_index(service: &str, index: &BTreeSet<String>) -> Result<(), VaultError> {
	if index.is_empty() {
		return delete_entry(service, IDENTITY_INDEX);
	}

	write_entry(service, IDENTITY_INDEX, &serde_json::to_string(index)?)
}
