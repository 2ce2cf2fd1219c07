//! Temporary key issuance with memoization
//!
//! [`TempKeyIssuer`] mints organization-scoped temporary keys through a
//! [`KeyManager`] and hands them out as [`SingleUseHandle`]s. Issuance through
//! [`TempKeyIssuer::request_cached_handle`] is memoized per organization and
//! key name for the TTL, so callers asking for the same key inside that window
//! share one backing key rather than getting independent ones.
//!
//! Concurrent misses on the same memo key are not coalesced: each racer mints
//! its own key and the last write wins the memo slot. Keys that lost the race
//! are reclaimed by the stale sweep once they outlive the TTL.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::cache::{Cache, CacheExt, CacheKeyGenerator, CacheKeyParams, DefaultKeyGenerator};
use crate::domain::temp_key::{
    KeyManager, KeyPermission, TempKeyError, TempKeyStore, TemporaryCredential,
};
use crate::infrastructure::observability::{record_issue, record_memo_lookup};

use super::handle::SingleUseHandle;

const MEMO_NAMESPACE: &str = "temp_keys";

/// Reason used when the key manager returns neither a key nor an error
pub const GENERIC_FAILURE: &str = "Failed to create API key";

/// Memoized issuance outcome; failures are remembered too
type MemoizedIssue = Result<TemporaryCredential, String>;

/// Issuer settings
#[derive(Debug, Clone)]
pub struct IssuerConfig {
    /// Lifetime of memo entries and age after which temp keys are swept
    pub ttl: Duration,
    /// Name given to keys requested without one
    pub default_key_name: String,
    /// Sweep every stale temp key whenever a handle is cleaned up
    pub sweep_on_cleanup: bool,
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            default_key_name: "auto-generated-experiment-key".to_string(),
            sweep_on_cleanup: true,
        }
    }
}

impl IssuerConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_default_key_name(mut self, name: impl Into<String>) -> Self {
        self.default_key_name = name.into();
        self
    }

    pub fn with_sweep_on_cleanup(mut self, enabled: bool) -> Self {
        self.sweep_on_cleanup = enabled;
        self
    }
}

/// Issues memoized, single-use temporary keys
pub struct TempKeyIssuer {
    key_manager: Arc<dyn KeyManager>,
    store: Arc<dyn TempKeyStore>,
    cache: Arc<dyn Cache>,
    key_generator: DefaultKeyGenerator,
    config: IssuerConfig,
}

impl fmt::Debug for TempKeyIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TempKeyIssuer")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

impl TempKeyIssuer {
    pub fn new(
        key_manager: Arc<dyn KeyManager>,
        store: Arc<dyn TempKeyStore>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            key_manager,
            store,
            cache,
            key_generator: DefaultKeyGenerator::new(),
            config: IssuerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IssuerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Mint a temporary key without memoization
    ///
    /// Defaults: the configured key name and [`KeyPermission::Write`].
    pub async fn request_credential(
        &self,
        organization_id: &str,
        key_name: Option<&str>,
        permission: Option<KeyPermission>,
    ) -> Result<TemporaryCredential, TempKeyError> {
        validate_organization_id(organization_id)?;

        let name = key_name.unwrap_or(&self.config.default_key_name);
        let permission = permission.unwrap_or_default();

        let result = match self
            .key_manager
            .create_temp_key(organization_id, name, permission)
            .await
        {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(TempKeyError::generation_failed(GENERIC_FAILURE)),
            Err(e) if e.message().is_empty() => {
                Err(TempKeyError::generation_failed(GENERIC_FAILURE))
            }
            Err(e) => Err(TempKeyError::generation_failed(e.message())),
        };

        record_issue(result.is_ok());

        match &result {
            Ok(credential) => info!(
                organization_id,
                key_id = %credential.id(),
                permission = %permission,
                "Issued temporary key"
            ),
            Err(e) => warn!(organization_id, "Temporary key issuance failed: {}", e),
        }

        result
    }

    /// Get a handle to the memoized key for `(organization_id, key_name)`
    ///
    /// A live memo entry is reused, failures included. On a miss a new key is
    /// minted with the default permission and remembered for the TTL. Memo
    /// cache errors degrade to a miss and never fail the request.
    pub async fn request_cached_handle(
        &self,
        organization_id: &str,
        key_name: Option<&str>,
    ) -> Result<SingleUseHandle, TempKeyError> {
        validate_organization_id(organization_id)?;

        let memo_key = self.memo_key(organization_id, key_name);

        let outcome = match self.lookup(&memo_key).await {
            Some(outcome) => outcome,
            None => {
                let outcome: MemoizedIssue =
                    match self.request_credential(organization_id, key_name, None).await {
                        Ok(credential) => Ok(credential),
                        Err(TempKeyError::GenerationFailed { reason }) => Err(reason),
                        Err(other) => return Err(other),
                    };

                self.remember(&memo_key, &outcome).await;
                outcome
            }
        };

        let credential = outcome.map_err(TempKeyError::generation_failed)?;
        Ok(self.wrap(credential))
    }

    /// Drop the memo entry for `(organization_id, key_name)`
    ///
    /// Returns whether an entry was removed.
    pub async fn forget(&self, organization_id: &str, key_name: Option<&str>) -> bool {
        let memo_key = self.memo_key(organization_id, key_name);

        match self.cache.delete(&memo_key).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(memo_key, "Failed to drop memoized temporary key: {}", e);
                false
            }
        }
    }

    fn wrap(&self, credential: TemporaryCredential) -> SingleUseHandle {
        SingleUseHandle::new(
            credential,
            Arc::clone(&self.store),
            self.config.ttl,
            self.config.sweep_on_cleanup,
        )
    }

    fn memo_key(&self, organization_id: &str, key_name: Option<&str>) -> String {
        let params =
            CacheKeyParams::new(organization_id).with_component("name", key_name.unwrap_or(""));

        self.key_generator
            .generate_with_namespace(MEMO_NAMESPACE, &params)
    }

    async fn lookup(&self, memo_key: &str) -> Option<MemoizedIssue> {
        match self.cache.get::<MemoizedIssue>(memo_key).await {
            Ok(Some(outcome)) => {
                record_memo_lookup(true);
                debug!(memo_key, "Memoized temporary key hit");
                Some(outcome)
            }
            Ok(None) => {
                record_memo_lookup(false);
                None
            }
            Err(e) => {
                record_memo_lookup(false);
                warn!(memo_key, "Memo cache lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    async fn remember(&self, memo_key: &str, outcome: &MemoizedIssue) {
        if let Err(e) = self.cache.set(memo_key, outcome, self.config.ttl).await {
            warn!(memo_key, "Failed to memoize temporary key: {}", e);
        }
    }
}

fn validate_organization_id(organization_id: &str) -> Result<(), TempKeyError> {
    if organization_id.trim().is_empty() {
        return Err(TempKeyError::invalid_request(
            "organization id must not be empty",
        ));
    }

    Ok(())
}
