//! Temporary key infrastructure

mod generator;
mod handle;
mod in_memory;
mod issuer;
mod key_manager;
mod postgres;
mod sweeper;

pub use generator::{GeneratedTempKey, KeyRegion, TempKeyGenerator};
pub use handle::SingleUseHandle;
pub use in_memory::InMemoryTempKeyStore;
pub use issuer::{IssuerConfig, TempKeyIssuer, GENERIC_FAILURE};
pub use key_manager::StoreKeyManager;
pub use postgres::PostgresTempKeyStore;
pub use sweeper::{stale_cutoff, TempKeySweeper};
