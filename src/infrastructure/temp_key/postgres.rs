//! PostgreSQL temp key store

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::temp_key::{KeyPermission, TempKeyId, TempKeyRecord, TempKeyStore};
use crate::domain::DomainError;

const TABLE: &str = "helicone_api_keys";

/// Temp key store backed by the `helicone_api_keys` table
#[derive(Clone)]
pub struct PostgresTempKeyStore {
    pool: PgPool,
}

impl fmt::Debug for PostgresTempKeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresTempKeyStore")
            .field("table", &TABLE)
            .finish()
    }
}

impl PostgresTempKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<TempKeyRecord, DomainError> {
        let read = |e: sqlx::Error| DomainError::storage(format!("Failed to read temp key row: {}", e));

        let id: Uuid = row.try_get("id").map_err(read)?;
        let organization_id: String = row.try_get("organization_id").map_err(read)?;
        let key_name: String = row.try_get("api_key_name").map_err(read)?;
        let key_hash: String = row.try_get("api_key_hash").map_err(read)?;
        let permission: String = row.try_get("key_permissions").map_err(read)?;
        let temp_key: bool = row.try_get("temp_key").map_err(read)?;
        let soft_delete: bool = row.try_get("soft_delete").map_err(read)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;

        let permission: KeyPermission = permission
            .parse()
            .map_err(|e| DomainError::storage(format!("Corrupt key_permissions: {}", e)))?;

        let record = TempKeyRecord::new(
            TempKeyId::from_uuid(id),
            organization_id,
            key_name,
            key_hash,
            permission,
        )
        .with_created_at(created_at)
        .with_soft_delete(soft_delete);

        Ok(if temp_key { record } else { record.permanent() })
    }
}

#[async_trait]
impl TempKeyStore for PostgresTempKeyStore {
    async fn insert(&self, record: TempKeyRecord) -> Result<TempKeyRecord, DomainError> {
        let query = format!(
            r#"
            INSERT INTO {} (id, organization_id, api_key_name, api_key_hash,
                            key_permissions, temp_key, soft_delete, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            TABLE
        );

        sqlx::query(&query)
            .bind(record.id().as_uuid())
            .bind(record.organization_id())
            .bind(record.key_name())
            .bind(record.key_hash())
            .bind(record.permission().as_str())
            .bind(record.is_temp_key())
            .bind(record.is_soft_deleted())
            .bind(record.created_at())
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    DomainError::conflict(format!("Temp key '{}' already exists", record.id()))
                }
                _ => DomainError::storage(format!("Failed to insert temp key: {}", e)),
            })?;

        Ok(record)
    }

    async fn get(&self, id: &TempKeyId) -> Result<Option<TempKeyRecord>, DomainError> {
        let query = format!(
            r#"
            SELECT id, organization_id, api_key_name, api_key_hash, key_permissions,
                   temp_key, soft_delete, created_at
            FROM {} WHERE id = $1
            "#,
            TABLE
        );

        let row = sqlx::query(&query)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get temp key: {}", e)))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn soft_delete_stale(&self, created_before: DateTime<Utc>) -> Result<u64, DomainError> {
        let query = format!(
            r#"
            UPDATE {} SET soft_delete = TRUE
            WHERE temp_key = TRUE AND soft_delete = FALSE AND created_at < $1
            "#,
            TABLE
        );

        let result = sqlx::query(&query)
            .bind(created_before)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to sweep stale temp keys: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &TempKeyId) -> Result<u64, DomainError> {
        let query = format!("DELETE FROM {} WHERE id = $1", TABLE);

        let result = sqlx::query(&query)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete temp key: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn count_live(&self, organization_id: &str) -> Result<usize, DomainError> {
        let query = format!(
            r#"
            SELECT COUNT(*) FROM {}
            WHERE organization_id = $1 AND temp_key = TRUE AND soft_delete = FALSE
            "#,
            TABLE
        );

        let count: i64 = sqlx::query_scalar(&query)
            .bind(organization_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count temp keys: {}", e)))?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::infrastructure::storage::{connect_pool, run_storage_migrations, PostgresConfig};

    async fn get_test_store() -> PostgresTempKeyStore {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/helicone_test".to_string());
        let pool = connect_pool(&PostgresConfig::new(url)).await.unwrap();
        run_storage_migrations(&pool).await.unwrap();

        PostgresTempKeyStore::new(pool)
    }

    fn unique_org() -> String {
        format!("org-{}", Uuid::new_v4())
    }

    fn record(org: &str) -> TempKeyRecord {
        TempKeyRecord::new(
            TempKeyId::new(),
            org,
            "experiment-run",
            "sha256$abc",
            KeyPermission::ReadWrite,
        )
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_get_round_trip() {
        let store = get_test_store().await;
        let org = unique_org();

        let temp = store.insert(record(&org)).await.unwrap();
        let permanent = store
            .insert(record(&org).with_soft_delete(true).permanent())
            .await
            .unwrap();

        let loaded = store.get(temp.id()).await.unwrap().unwrap();
        assert_eq!(loaded.organization_id(), org);
        assert_eq!(loaded.key_name(), "experiment-run");
        assert_eq!(loaded.key_hash(), "sha256$abc");
        assert_eq!(loaded.permission(), KeyPermission::ReadWrite);
        assert!(loaded.is_temp_key());
        assert!(!loaded.is_soft_deleted());
        assert_eq!(
            loaded.created_at().timestamp_micros(),
            temp.created_at().timestamp_micros()
        );

        let loaded = store.get(permanent.id()).await.unwrap().unwrap();
        assert!(!loaded.is_temp_key());
        assert!(loaded.is_soft_deleted());

        assert!(store.get(&TempKeyId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_duplicate_insert_is_conflict() {
        let store = get_test_store().await;
        let row = record(&unique_org());

        store.insert(row.clone()).await.unwrap();
        let result = store.insert(row).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_sweep_touches_only_stale_temp_keys() {
        let store = get_test_store().await;
        let org = unique_org();
        let now = Utc::now();
        let old = now - Duration::hours(2);

        let stale = store.insert(record(&org).with_created_at(old)).await.unwrap();
        let stale_permanent = store
            .insert(record(&org).with_created_at(old).permanent())
            .await
            .unwrap();
        let fresh = store.insert(record(&org)).await.unwrap();

        // Other tests share the table, so only this org's rows are checked
        store
            .soft_delete_stale(now - Duration::minutes(30))
            .await
            .unwrap();

        for (row, swept) in [(stale, true), (stale_permanent, false), (fresh, false)] {
            let loaded = store.get(row.id()).await.unwrap().unwrap();
            assert_eq!(loaded.is_soft_deleted(), swept);
        }

        assert_eq!(store.count_live(&org).await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_postgres_delete_reports_rows_affected() {
        let store = get_test_store().await;
        let row = store.insert(record(&unique_org())).await.unwrap();

        assert_eq!(store.delete(row.id()).await.unwrap(), 1);
        assert_eq!(store.delete(row.id()).await.unwrap(), 0);
        assert!(store.get(row.id()).await.unwrap().is_none());
    }
}
