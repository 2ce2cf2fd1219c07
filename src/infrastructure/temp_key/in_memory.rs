//! In-memory temp key store implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::temp_key::{TempKeyId, TempKeyRecord, TempKeyStore};
use crate::domain::DomainError;

/// In-memory implementation of TempKeyStore
#[derive(Debug, Default)]
pub struct InMemoryTempKeyStore {
    rows: Arc<RwLock<HashMap<TempKeyId, TempKeyRecord>>>,
}

impl InMemoryTempKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of rows, soft-deleted ones included
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl TempKeyStore for InMemoryTempKeyStore {
    async fn insert(&self, record: TempKeyRecord) -> Result<TempKeyRecord, DomainError> {
        let mut rows = self.rows.write().await;

        if rows.contains_key(record.id()) {
            return Err(DomainError::conflict(format!(
                "Temp key '{}' already exists",
                record.id()
            )));
        }

        rows.insert(*record.id(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: &TempKeyId) -> Result<Option<TempKeyRecord>, DomainError> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn soft_delete_stale(&self, created_before: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().await;
        let mut marked = 0;

        for row in rows.values_mut().filter(|r| r.is_stale(created_before)) {
            row.mark_soft_deleted();
            marked += 1;
        }

        Ok(marked)
    }

    async fn delete(&self, id: &TempKeyId) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(id).map_or(0, |_| 1))
    }

    async fn count_live(&self, organization_id: &str) -> Result<usize, DomainError> {
        let rows = self.rows.read().await;

        Ok(rows
            .values()
            .filter(|r| {
                r.is_temp_key() && !r.is_soft_deleted() && r.organization_id() == organization_id
            })
            .count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::temp_key::KeyPermission;
    use chrono::Duration;

    fn record(org: &str) -> TempKeyRecord {
        TempKeyRecord::new(TempKeyId::new(), org, "test-key", "sha256$x", KeyPermission::Write)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryTempKeyStore::new();
        let row = store.insert(record("org-1")).await.unwrap();

        let fetched = store.get(row.id()).await.unwrap().unwrap();
        assert_eq!(fetched, row);
    }

    #[tokio::test]
    async fn test_insert_duplicate_conflicts() {
        let store = InMemoryTempKeyStore::new();
        let row = store.insert(record("org-1")).await.unwrap();

        let result = store.insert(row).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_delete_returns_exact_count() {
        let store = InMemoryTempKeyStore::new();
        let row = store.insert(record("org-1")).await.unwrap();

        assert_eq!(store.delete(row.id()).await.unwrap(), 1);
        assert_eq!(store.delete(row.id()).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_soft_delete_stale_only_touches_old_temp_keys() {
        let store = InMemoryTempKeyStore::new();
        let now = Utc::now();

        let old = store
            .insert(record("org-1").with_created_at(now - Duration::hours(2)))
            .await
            .unwrap();
        let fresh = store.insert(record("org-1")).await.unwrap();
        let old_permanent = store
            .insert(
                record("org-1")
                    .with_created_at(now - Duration::hours(2))
                    .permanent(),
            )
            .await
            .unwrap();

        let marked = store
            .soft_delete_stale(now - Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(marked, 1);

        assert!(store.get(old.id()).await.unwrap().unwrap().is_soft_deleted());
        assert!(!store.get(fresh.id()).await.unwrap().unwrap().is_soft_deleted());
        assert!(
            !store
                .get(old_permanent.id())
                .await
                .unwrap()
                .unwrap()
                .is_soft_deleted()
        );

        // Already-swept rows are not counted twice
        let marked = store
            .soft_delete_stale(now - Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(marked, 0);
    }

    #[tokio::test]
    async fn test_count_live() {
        let store = InMemoryTempKeyStore::new();
        store.insert(record("org-1")).await.unwrap();
        store.insert(record("org-1")).await.unwrap();
        store.insert(record("org-2")).await.unwrap();
        store
            .insert(record("org-1").with_soft_delete(true))
            .await
            .unwrap();

        assert_eq!(store.count_live("org-1").await.unwrap(), 2);
        assert_eq!(store.count_live("org-2").await.unwrap(), 1);
        assert_eq!(store.count_live("org-3").await.unwrap(), 0);
    }
}
