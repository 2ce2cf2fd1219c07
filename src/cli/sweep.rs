//! Sweep command - soft-deletes stale temporary keys

use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Keep sweeping on the configured interval until interrupted
    #[arg(long)]
    pub watch: bool,
}

pub async fn run(args: SweepArgs) -> anyhow::Result<()> {
    let config = super::bootstrap();
    let services = crate::create_services_with_config(&config).await?;

    if args.watch {
        services.sweeper.run_until(super::shutdown_signal()).await?;
        return Ok(());
    }

    let swept = services.sweeper.sweep_once().await?;
    info!(swept, "Sweep complete");
    println!("{}", swept);

    Ok(())
}
