//! Temporary key store trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::{TempKeyId, TempKeyRecord};
use crate::domain::DomainError;

/// Persistent store for temporary key rows
#[async_trait]
pub trait TempKeyStore: Send + Sync + Debug {
    /// Insert a new row, failing on duplicate id
    async fn insert(&self, record: TempKeyRecord) -> Result<TempKeyRecord, DomainError>;

    /// Get a row by id, including soft-deleted rows
    async fn get(&self, id: &TempKeyId) -> Result<Option<TempKeyRecord>, DomainError>;

    /// Soft-delete every temp key created before `created_before`
    ///
    /// Returns the number of rows marked.
    async fn soft_delete_stale(&self, created_before: DateTime<Utc>) -> Result<u64, DomainError>;

    /// Hard-delete a row, returning the exact number of rows removed
    async fn delete(&self, id: &TempKeyId) -> Result<u64, DomainError>;

    /// Count temp keys of an organization that are not soft-deleted
    async fn count_live(&self, organization_id: &str) -> Result<usize, DomainError>;
}
