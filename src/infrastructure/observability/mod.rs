//! Observability infrastructure - Metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use self::metrics::{init_metrics, record_cleanup, record_issue, record_memo_lookup, record_swept};
