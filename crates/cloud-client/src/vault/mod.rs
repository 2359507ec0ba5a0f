//! Durable per-identity credential storage.
//!
//! The vault is an external collaborator: the session layer only ever talks to it through
//! [`CredentialVault`], so an OS keychain, an encrypted file or a test double can be swapped in
//! without touching anything else. Failures are always surfaced to the caller.

use crate::{error::VaultError, Credential, Identity};

use async_trait::async_trait;

mod keychain;
mod memory;

pub use keychain::KeyringVault;
pub use memory::MemoryVault;

#[async_trait]
pub trait CredentialVault: Send + Sync + 'static {
	async fn save(&self, credential: &Credential, identity: &Identity) -> Result<(), VaultError>;

	async fn read(&self, identity: &Identity) -> Result<Option<Credential>, VaultError>;

	/// Deleting an identity that has nothing stored is not an error
	async fn delete(&self, identity: &Identity) -> Result<(), VaultError>;

	async fn list_identities(&self) -> Result<Vec<Identity>, VaultError>;
}
