//! Logwarden CLI entry point.

use clap::Parser;

use logwarden::cli::{Cli, Commands};
use logwarden::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `run` installs the full pipeline itself
    if !matches!(cli.command, Commands::Run(_)) {
        if let Err(err) = LoggerImpl::init_diagnostics() {
            eprintln!("{err:#}");
        }
    }

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(err) => logwarden::cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => logwarden::cli::commands::run::execute(args, config, cli.json).await,
        Commands::Sweep(args) => {
            logwarden::cli::commands::sweep::execute(args, config, cli.json).await
        }
        Commands::Redact(args) => {
            logwarden::cli::commands::redact::execute(args, config, cli.json).await
        }
        Commands::Config(args) => {
            logwarden::cli::commands::config::execute(args, config, cli.json).await
        }
    };

    if let Err(err) = result {
        logwarden::cli::handle_error(err, cli.json);
    }
}
