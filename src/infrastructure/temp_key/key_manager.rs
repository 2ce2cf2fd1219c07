//! Store-backed key manager

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::temp_key::{
    KeyManager, KeyManagerError, KeyPermission, TempKeyId, TempKeyRecord, TempKeyStore,
    TemporaryCredential,
};

use super::generator::TempKeyGenerator;

/// Key manager that mints keys locally and persists their hash in a [`TempKeyStore`]
pub struct StoreKeyManager {
    store: Arc<dyn TempKeyStore>,
    generator: TempKeyGenerator,
}

impl fmt::Debug for StoreKeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreKeyManager")
            .field("store", &self.store)
            .field("prefix", &self.generator.full_prefix())
            .finish()
    }
}

impl StoreKeyManager {
    pub fn new(store: Arc<dyn TempKeyStore>) -> Self {
        Self {
            store,
            generator: TempKeyGenerator::default(),
        }
    }

    pub fn with_generator(mut self, generator: TempKeyGenerator) -> Self {
        self.generator = generator;
        self
    }
}

#[async_trait]
impl KeyManager for StoreKeyManager {
    async fn create_temp_key(
        &self,
        organization_id: &str,
        name: &str,
        permission: KeyPermission,
    ) -> Result<Option<TemporaryCredential>, KeyManagerError> {
        if name.trim().is_empty() {
            return Err(KeyManagerError::new("Key name must not be empty"));
        }

        let generated = self.generator.generate();
        let record = TempKeyRecord::new(
            TempKeyId::new(),
            organization_id,
            name,
            &generated.hash,
            permission,
        );

        debug!(
            organization_id,
            permission = %permission,
            "Persisting temporary key"
        );

        let created = self.store.insert(record).await?;

        info!(
            organization_id,
            key_id = %created.id(),
            "Temporary key created"
        );

        Ok(Some(TemporaryCredential::new(generated.key, *created.id())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::temp_key::{InMemoryTempKeyStore, KeyRegion};

    #[tokio::test]
    async fn test_create_temp_key_persists_hash_only() {
        let store = Arc::new(InMemoryTempKeyStore::new());
        let generator = TempKeyGenerator::default();
        let manager = StoreKeyManager::new(store.clone()).with_generator(generator.clone());

        let credential = manager
            .create_temp_key("org-1", "experiment", KeyPermission::ReadWrite)
            .await
            .unwrap()
            .unwrap();

        let row = store.get(credential.id()).await.unwrap().unwrap();
        assert_eq!(row.organization_id(), "org-1");
        assert_eq!(row.key_name(), "experiment");
        assert_eq!(row.permission(), KeyPermission::ReadWrite);
        assert!(row.is_temp_key());
        assert!(!row.is_soft_deleted());
        assert_ne!(row.key_hash(), credential.api_key());
        assert_eq!(generator.hash_key(credential.api_key()), row.key_hash());
    }

    #[tokio::test]
    async fn test_create_temp_key_uses_region_prefix() {
        let store = Arc::new(InMemoryTempKeyStore::new());
        let manager = StoreKeyManager::new(store)
            .with_generator(TempKeyGenerator::new("sk-helicone", KeyRegion::Eu));

        let credential = manager
            .create_temp_key("org-1", "experiment", KeyPermission::Write)
            .await
            .unwrap()
            .unwrap();

        assert!(credential.api_key().starts_with("sk-helicone-eu-"));
    }

    #[tokio::test]
    async fn test_create_temp_key_rejects_empty_name() {
        let store = Arc::new(InMemoryTempKeyStore::new());
        let manager = StoreKeyManager::new(store.clone());

        let result = manager
            .create_temp_key("org-1", "  ", KeyPermission::Write)
            .await;

        assert!(result.is_err());
        assert!(store.is_empty().await);
    }
}
