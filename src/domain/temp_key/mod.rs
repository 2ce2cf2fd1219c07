//! Temporary key domain
//!
//! Types and collaborator traits for short-lived, single-use API keys scoped
//! to an organization: the credential itself, its persisted row, the key
//! manager that mints it and the store that revokes it.

mod entity;
mod error;
mod manager;
mod store;

pub use entity::{KeyPermission, TempKeyId, TempKeyRecord, TemporaryCredential};
pub use error::{KeyManagerError, TempKeyError};
pub use manager::KeyManager;
pub use store::TempKeyStore;

#[cfg(test)]
pub use manager::MockKeyManager;
#[cfg(test)]
pub use store::mock::RecordingTempKeyStore;
