//! Prometheus metrics infrastructure

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use super::config::MetricsConfig;

/// Install the Prometheus recorder and its HTTP scrape listener
///
/// Returns whether a recorder was installed. Without one, the `record_*`
/// helpers are no-ops.
pub fn init_metrics(config: &MetricsConfig) -> bool {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return false;
    }

    let addr: SocketAddr = match config.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid metrics listen address '{}': {}", config.listen_addr, e);
            return false;
        }
    };

    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            gauge!("temp_keys_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics listening on {}", addr);
            true
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            false
        }
    }
}

/// Outcome of a key generation attempt
pub fn record_issue(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!("temp_keys_issued_total", "outcome" => outcome).increment(1);
}

/// Memoization lookup result
pub fn record_memo_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("temp_keys_memo_lookups_total", "result" => result).increment(1);
}

/// Cleanup step outcome; `step` is `sweep` or `delete`
pub fn record_cleanup(step: &'static str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!("temp_keys_cleanup_total", "step" => step, "status" => status).increment(1);
}

/// Rows soft-deleted by a sweep
pub fn record_swept(count: u64) {
    counter!("temp_keys_swept_total").increment(count);
}
