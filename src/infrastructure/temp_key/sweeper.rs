//! Periodic soft-delete sweep of stale temporary keys

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::domain::temp_key::TempKeyStore;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_swept;

/// `now - ttl`, or `None` when the TTL does not fit a timestamp offset
pub fn stale_cutoff(ttl: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
}

/// Soft-deletes temp keys older than the TTL on a fixed interval
#[derive(Debug)]
pub struct TempKeySweeper {
    store: Arc<dyn TempKeyStore>,
    ttl: Duration,
    interval: Duration,
}

impl TempKeySweeper {
    pub fn new(store: Arc<dyn TempKeyStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            interval: Duration::from_secs(300),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run a single sweep, returning the number of rows soft-deleted
    pub async fn sweep_once(&self) -> Result<u64, DomainError> {
        let cutoff = stale_cutoff(self.ttl).ok_or_else(|| {
            DomainError::configuration(format!("Temp key TTL {:?} is out of range", self.ttl))
        })?;

        let swept = self.store.soft_delete_stale(cutoff).await?;
        record_swept(swept);

        debug!(swept, cutoff = %cutoff, "Swept stale temporary keys");
        Ok(swept)
    }

    /// Sweep on every tick until `shutdown` resolves
    ///
    /// The first sweep runs immediately. Failed sweeps are logged and retried
    /// on the next tick. A zero interval is rejected before anything runs.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), DomainError>
    where
        F: Future<Output = ()>,
    {
        if self.interval.is_zero() {
            return Err(DomainError::configuration(
                "Temp key sweep interval must be greater than zero",
            ));
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval = ?self.interval, ttl = ?self.ttl, "Temp key sweeper started");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Temp key sweeper stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        warn!("Temp key sweep failed: {}", e);
                    }
                }
            }
        }
    }
}
