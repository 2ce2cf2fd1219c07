use std::time::Duration;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::cache::CacheConfig;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::storage::PostgresConfig;
use crate::infrastructure::temp_key::{IssuerConfig, KeyRegion, TempKeyGenerator};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub temp_keys: TempKeySettings,
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TempKeySettings {
    /// Memo lifetime and stale-key age
    pub ttl_secs: u64,
    pub region: KeyRegion,
    pub key_prefix: String,
    pub default_key_name: String,
    pub sweep_on_cleanup: bool,
    pub sweep_interval_secs: u64,
}

impl Default for TempKeySettings {
    fn default() -> Self {
        Self {
            ttl_secs: 30 * 60,
            region: KeyRegion::Default,
            key_prefix: "sk-helicone".to_string(),
            default_key_name: "auto-generated-experiment-key".to_string(),
            sweep_on_cleanup: true,
            sweep_interval_secs: 300,
        }
    }
}

impl TempKeySettings {
    /// Reject durations that would make memo entries or the sweeper unusable
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.ttl_secs == 0 {
            return Err(DomainError::configuration("temp_keys.ttl_secs must be greater than zero"));
        }

        if self.sweep_interval_secs == 0 {
            return Err(DomainError::configuration(
                "temp_keys.sweep_interval_secs must be greater than zero",
            ));
        }

        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn issuer_config(&self) -> IssuerConfig {
        IssuerConfig::default()
            .with_ttl(self.ttl())
            .with_default_key_name(self.default_key_name.clone())
            .with_sweep_on_cleanup(self.sweep_on_cleanup)
    }

    pub fn key_generator(&self) -> TempKeyGenerator {
        TempKeyGenerator::new(self.key_prefix.clone(), self.region)
    }
}

/// PostgreSQL settings; no `url` selects the in-memory store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let pool = PostgresConfig::default();

        Self {
            url: None,
            max_connections: pool.max_connections,
            min_connections: pool.min_connections,
            connect_timeout_secs: pool.connect_timeout_secs,
            idle_timeout_secs: pool.idle_timeout_secs,
        }
    }
}

impl DatabaseConfig {
    pub fn postgres_config(&self) -> Option<PostgresConfig> {
        let url = self.url.as_ref()?;

        Some(
            PostgresConfig::new(url.clone())
                .with_max_connections(self.max_connections)
                .with_min_connections(self.min_connections)
                .with_connect_timeout(self.connect_timeout_secs)
                .with_idle_timeout(self.idle_timeout_secs),
        )
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config
            .temp_keys
            .validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::CacheType;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.temp_keys.ttl(), Duration::from_secs(1800));
        assert!(config.temp_keys.sweep_on_cleanup);
        assert_eq!(config.cache.cache_type, CacheType::InMemory);
        assert!(config.database.postgres_config().is_none());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_issuer_config_from_settings() {
        let settings = TempKeySettings {
            ttl_secs: 60,
            default_key_name: "ci-key".to_string(),
            sweep_on_cleanup: false,
            ..Default::default()
        };

        let issuer = settings.issuer_config();
        assert_eq!(issuer.ttl, Duration::from_secs(60));
        assert_eq!(issuer.default_key_name, "ci-key");
        assert!(!issuer.sweep_on_cleanup);
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        assert!(TempKeySettings::default().validate().is_ok());

        let zero_interval = TempKeySettings {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_interval.validate(),
            Err(DomainError::Configuration { .. })
        ));

        let zero_ttl = TempKeySettings {
            ttl_secs: 0,
            ..Default::default()
        };
        assert!(matches!(zero_ttl.validate(), Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_eu_region_selects_prefix() {
        let settings = TempKeySettings {
            region: KeyRegion::Eu,
            ..Default::default()
        };

        assert_eq!(settings.key_generator().full_prefix(), "sk-helicone-eu");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "temp_keys": {"ttl_secs": 120, "region": "eu"},
                "database": {"url": "postgres://db/helicone", "max_connections": 4}
            }"#,
        )
        .unwrap();

        assert_eq!(config.temp_keys.ttl_secs, 120);
        assert_eq!(config.temp_keys.region, KeyRegion::Eu);
        assert_eq!(config.temp_keys.default_key_name, "auto-generated-experiment-key");

        let pool = config.database.postgres_config().unwrap();
        assert_eq!(pool.url, "postgres://db/helicone");
        assert_eq!(pool.max_connections, 4);
        assert_eq!(pool.min_connections, 1);
    }
}
