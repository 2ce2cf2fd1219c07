//! Migrate command - manages the temp key schema

use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{revert_last_storage_migration, run_storage_migrations};

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Revert the most recent migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();

    let pool = crate::connect_database(&config)
        .await?
        .ok_or_else(|| anyhow::anyhow!("database.url must be set to run migrations"))?;

    if args.revert {
        match revert_last_storage_migration(&pool).await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("No migrations to revert"),
        }
    } else {
        let applied = run_storage_migrations(&pool).await?;
        info!(applied, "Migrations complete");
    }

    Ok(())
}
