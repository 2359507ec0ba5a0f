use super::CredentialVault;
use crate::{error::VaultError, Credential, Identity};

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local vault, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryVault {
	credentials: RwLock<BTreeMap<Identity, Credential>>,
}

impl MemoryVault {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl CredentialVault for MemoryVault {
	async fn save(&self, credential: &Credential, identity: &Identity) -> Result<(), VaultError> {
		self.credentials
			.write()
			.await
			.insert(identity.clone(), credential.clone());

		Ok(())
	}

	async fn read(&self, identity: &Identity) -> Result<Option<Credential>, VaultError> {
		Ok(self.credentials.read().await.get(identity).cloned())
	}

	async fn delete(&self, identity: &Identity) -> Result<(), VaultError> {
		self.credentials.write().await.remove(identity);

		Ok(())
	}

	async fn list_identities(&self) -> Result<Vec<Identity>, VaultError> {
		Ok(self.credentials.read().await.keys().cloned().collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn save_read_delete() {
		let vault = MemoryVault::new();
		let alice = Identity::from("alice");

		assert_eq!(vault.read(&alice).await.unwrap(), None);

		vault
			.save(&Credential::bearer("token-a"), &alice)
			.await
			.unwrap();
		vault
			.save(&Credential::bearer("token-b"), &Identity::from("bob"))
			.await
			.unwrap();

		assert_eq!(
			vault.read(&alice).await.unwrap(),
			Some(Credential::bearer("token-a"))
		);
		assert_eq!(
			vault.list_identities().await.unwrap(),
			vec![Identity::from("alice"), Identity::from("bob")]
		);

		vault.delete(&alice).await.unwrap();
		vault.delete(&alice).await.unwrap();

		assert_eq!(vault.read(&alice).await.unwrap(), None);
		assert_eq!(
			vault.list_identities().await.unwrap(),
			vec![Identity::from("bob")]
		);
	}
}
