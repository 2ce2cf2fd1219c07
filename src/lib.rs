//! Helicone temporary API keys
//!
//! Issues short-lived, organization-scoped API keys for one-off jobs such as
//! experiment runs:
//! - Memoized issuance per organization and key name
//! - Single-use handles that revoke their key when the job finishes
//! - Soft-delete sweep of temporary keys that outlive their TTL
//! - In-memory or PostgreSQL key storage, in-memory or Redis memo cache

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use domain::temp_key::TempKeyStore;
use infrastructure::{
    cache::CacheFactory,
    storage::connect_pool,
    temp_key::{
        InMemoryTempKeyStore, PostgresTempKeyStore, StoreKeyManager, TempKeyIssuer,
        TempKeySweeper,
    },
};

/// Wired temporary key services
#[derive(Debug)]
pub struct TempKeyServices {
    pub store: Arc<dyn TempKeyStore>,
    pub issuer: TempKeyIssuer,
    pub sweeper: TempKeySweeper,
}

/// Open the configured database pool, if any
pub async fn connect_database(config: &AppConfig) -> anyhow::Result<Option<PgPool>> {
    let Some(pg_config) = config.database.postgres_config() else {
        return Ok(None);
    };

    info!("Connecting to PostgreSQL...");
    let pool = connect_pool(&pg_config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
    info!("PostgreSQL connection established");

    Ok(Some(pool))
}

/// Create the temporary key services with default configuration
pub async fn create_services() -> anyhow::Result<TempKeyServices> {
    create_services_with_config(&AppConfig::default()).await
}

/// Create the temporary key services with custom configuration
pub async fn create_services_with_config(config: &AppConfig) -> anyhow::Result<TempKeyServices> {
    let store: Arc<dyn TempKeyStore> = match connect_database(config).await? {
        Some(pool) => {
            info!("Using PostgreSQL temp key store");
            Arc::new(PostgresTempKeyStore::new(pool))
        }
        None => {
            warn!("No database configured, temp keys live in process memory only");
            Arc::new(InMemoryTempKeyStore::new())
        }
    };

    create_services_with_store(config, store).await
}

/// Create the temporary key services over an existing store
pub async fn create_services_with_store(
    config: &AppConfig,
    store: Arc<dyn TempKeyStore>,
) -> anyhow::Result<TempKeyServices> {
    let settings = &config.temp_keys;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid temp key settings: {}", e))?;

    let cache = CacheFactory::new()
        .create(&config.cache, settings.ttl())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create memo cache: {}", e))?;

    let key_manager =
        Arc::new(StoreKeyManager::new(store.clone()).with_generator(settings.key_generator()));

    let issuer = TempKeyIssuer::new(key_manager, store.clone(), cache)
        .with_config(settings.issuer_config());

    let sweeper = TempKeySweeper::new(store.clone(), settings.ttl())
        .with_interval(settings.sweep_interval());

    info!(
        ttl_secs = settings.ttl_secs,
        region = ?settings.region,
        cache = %config.cache.cache_type,
        sweep_on_cleanup = settings.sweep_on_cleanup,
        "Temp key services initialized"
    );

    Ok(TempKeyServices {
        store,
        issuer,
        sweeper,
    })
}
