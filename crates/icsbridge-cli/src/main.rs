//! icsbridge CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use icsbridge_client::cli::{Cli, Command, ConfigAction};
use icsbridge_client::commands;
use icsbridge_client::config::ClientConfig;
use icsbridge_client::error::ClientResult;
use icsbridge_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = match cli.command {
        Some(Command::Run { .. }) if !cli.debug => TracingConfig::daemon(),
        _ => TracingConfig::cli(cli.debug),
    };
    if let Some(format) = cli.log_format {
        tracing_config = tracing_config.with_format(format);
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "icsbridge failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = match cli.config {
        Some(ref path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };

    match cli.command {
        Some(Command::Run { print_history }) => commands::run::run(&config, print_history).await,
        Some(Command::Sync { json }) => commands::sync::run_once(&config, json).await,
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        None => {
            println!("icsbridge - Mirror an ICS feed into a Google Calendar");
            println!();
            println!("Run 'icsbridge --help' for usage information.");
            println!();
            println!("Quick start:");
            println!("  1. Set the feed: ICS_URL=https://... or [feed] url in {}", config_path.display());
            println!("  2. Check it: icsbridge config validate");
            println!("  3. Sync once: icsbridge sync, or keep syncing: icsbridge run");
            Ok(())
        }
    }
}
