use clap::Parser;
use helicone_temp_keys::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Issue(args) => cli::issue::run(args).await,
        Command::Sweep(args) => cli::sweep::run(args).await,
        Command::Migrate(args) => cli::migrate::run(args).await,
    }
}
