//! Domain layer - Core types and collaborator traits

pub mod cache;
pub mod error;
pub mod temp_key;

pub use cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
pub use error::DomainError;
pub use temp_key::{
    KeyManager, KeyManagerError, KeyPermission, TempKeyError, TempKeyId, TempKeyRecord,
    TempKeyStore, TemporaryCredential,
};
