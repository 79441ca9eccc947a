use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use docket::cli::{Cli, Commands};
use docket::{commands, init_tracing, AppContext};
use docket_core::storage::SystemHost;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before parsing so that clap sees variables from `.env`
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.storage_root {
        Some(root) => debug!("Using storage root {}", root.display()),
        None => debug!("Using working directory as storage root"),
    }
    let cx = AppContext {
        host: Arc::new(SystemHost::from_config(cli.storage_root)),
    };

    match cli.command {
        Commands::Create(args) => commands::handle_create(args)?,
        Commands::Import(args) => commands::handle_import(args, &cx).await?,
        Commands::Show(args) => commands::handle_show(args)?,
        Commands::Open(args) => commands::handle_open(args, &cx)?,
    }

    Ok(())
}
