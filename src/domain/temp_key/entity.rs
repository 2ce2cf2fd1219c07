//! Temporary key entities

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Identifier of a persisted temporary key row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempKeyId(Uuid);

impl TempKeyId {
    /// Generate a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TempKeyId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TempKeyId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::validation(format!("Invalid temp key id '{}': {}", s, e)))
    }
}

impl fmt::Display for TempKeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access granted to a temporary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyPermission {
    #[serde(rename = "r")]
    Read,
    #[default]
    #[serde(rename = "w")]
    Write,
    #[serde(rename = "rw")]
    ReadWrite,
}

impl KeyPermission {
    /// Short wire form stored alongside the key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::ReadWrite => "rw",
        }
    }
}

impl FromStr for KeyPermission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "r" | "read" => Ok(Self::Read),
            "w" | "write" => Ok(Self::Write),
            "rw" | "read-write" | "read_write" => Ok(Self::ReadWrite),
            _ => Err(DomainError::validation(format!(
                "Unknown key permission: {}. Valid permissions: r, w, rw",
                s
            ))),
        }
    }
}

impl fmt::Display for KeyPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly minted key together with the id of its backing row
///
/// The raw key is only ever held here; the store keeps a hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryCredential {
    api_key: String,
    id: TempKeyId,
}

impl TemporaryCredential {
    pub fn new(api_key: impl Into<String>, id: TempKeyId) -> Self {
        Self {
            api_key: api_key.into(),
            id,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn id(&self) -> &TempKeyId {
        &self.id
    }
}

impl fmt::Debug for TemporaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredential")
            .field("api_key", &"<redacted>")
            .field("id", &self.id)
            .finish()
    }
}

/// Persisted row backing a temporary key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempKeyRecord {
    id: TempKeyId,
    organization_id: String,
    key_name: String,
    /// Format: algorithm$hash (e.g., "sha256$...")
    key_hash: String,
    permission: KeyPermission,
    temp_key: bool,
    soft_delete: bool,
    created_at: DateTime<Utc>,
}

impl TempKeyRecord {
    pub fn new(
        id: TempKeyId,
        organization_id: impl Into<String>,
        key_name: impl Into<String>,
        key_hash: impl Into<String>,
        permission: KeyPermission,
    ) -> Self {
        Self {
            id,
            organization_id: organization_id.into(),
            key_name: key_name.into(),
            key_hash: key_hash.into(),
            permission,
            temp_key: true,
            soft_delete: false,
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp (used when loading rows and in tests)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_soft_delete(mut self, soft_delete: bool) -> Self {
        self.soft_delete = soft_delete;
        self
    }

    /// Mark as a regular (non-temporary) key
    pub fn permanent(mut self) -> Self {
        self.temp_key = false;
        self
    }

    pub fn id(&self) -> &TempKeyId {
        &self.id
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn key_hash(&self) -> &str {
        &self.key_hash
    }

    pub fn permission(&self) -> KeyPermission {
        self.permission
    }

    pub fn is_temp_key(&self) -> bool {
        self.temp_key
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.soft_delete
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// A temp key created before `cutoff` that has not been soft-deleted yet
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        self.temp_key && !self.soft_delete && self.created_at < cutoff
    }

    pub fn mark_soft_deleted(&mut self) {
        self.soft_delete = true;
    }
}
