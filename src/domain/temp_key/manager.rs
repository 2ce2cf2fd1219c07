//! Key manager trait

use async_trait::async_trait;

use super::entity::{KeyPermission, TemporaryCredential};
use super::error::KeyManagerError;

#[cfg(test)]
use mockall::automock;

/// Authoritative source of new temporary keys
///
/// Implementations persist the key before returning it. `Ok(None)` means the
/// manager accepted the request but produced no key.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// Mint and persist a temporary key scoped to an organization
    async fn create_temp_key(
        &self,
        organization_id: &str,
        name: &str,
        permission: KeyPermission,
    ) -> Result<Option<TemporaryCredential>, KeyManagerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::temp_key::TempKeyId;

    #[tokio::test]
    async fn test_mock_key_manager() {
        let id = TempKeyId::new();
        let mut mock = MockKeyManager::new();
        mock.expect_create_temp_key()
            .withf(|org, name, permission| {
                org == "org-1" && name == "experiment" && *permission == KeyPermission::Read
            })
            .times(1)
            .returning(move |_, _, _| Ok(Some(TemporaryCredential::new("sk-test", id))));

        let created = mock
            .create_temp_key("org-1", "experiment", KeyPermission::Read)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.id(), &id);
        assert_eq!(created.api_key(), "sk-test");
    }
}
