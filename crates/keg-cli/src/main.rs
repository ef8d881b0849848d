//! keg - formula runner CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use keg_cli::cmd;
use keg_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let dry_run = cli.dry_run;

    match cli.command {
        Commands::Install { formula, verbose } => {
            cmd::install::install(&formula, dry_run, verbose).await
        }
        Commands::Check { formula } => cmd::check::check(&formula),
        Commands::Info { target } => cmd::info::info(&target),
        Commands::List => cmd::list::list(),
        Commands::Remove { name } => cmd::remove::remove(&name, dry_run),
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
