//! CLI for temporary key operations
//!
//! - `issue`: mint a temporary key and print it as JSON
//! - `sweep`: soft-delete stale temporary keys, once or until interrupted
//! - `migrate`: apply (or revert) the key table migrations

pub mod issue;
pub mod migrate;
pub mod sweep;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::infrastructure::observability::init_metrics;

/// Helicone temporary API keys
#[derive(Parser)]
#[command(name = "helicone-temp-keys")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Issue a temporary key for an organization
    Issue(issue::IssueArgs),

    /// Soft-delete temporary keys older than the TTL
    Sweep(sweep::SweepArgs),

    /// Run database migrations
    Migrate(migrate::MigrateArgs),
}

/// Load `.env` and configuration, then install logging and metrics
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    logging::init_logging(&config.logging);

    if let Some(e) = load_error {
        tracing::warn!("Failed to load configuration, using defaults: {}", e);
    }

    init_metrics(&config.metrics);
    config
}

pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_issue() {
        let cli = Cli::try_parse_from([
            "helicone-temp-keys",
            "issue",
            "--organization-id",
            "org-1",
            "--name",
            "nightly",
            "--permission",
            "rw",
        ])
        .unwrap();

        let Command::Issue(args) = cli.command else {
            panic!("expected issue command");
        };
        assert_eq!(args.organization_id, "org-1");
        assert_eq!(args.name.as_deref(), Some("nightly"));
        assert_eq!(
            args.permission,
            Some(crate::domain::temp_key::KeyPermission::ReadWrite)
        );
    }

    #[test]
    fn test_parse_sweep_watch() {
        let cli = Cli::try_parse_from(["helicone-temp-keys", "sweep", "--watch"]).unwrap();

        assert!(matches!(cli.command, Command::Sweep(args) if args.watch));
    }

    #[test]
    fn test_issue_requires_organization() {
        assert!(Cli::try_parse_from(["helicone-temp-keys", "issue"]).is_err());
    }
}
