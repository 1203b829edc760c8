//! Vigil CLI entry point.

use clap::Parser;

use vigil::cli::{Cli, Commands};
use vigil::infrastructure::config::ConfigLoader;
use vigil::infrastructure::logging::Logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    // The guard inside Logger must live until exit so the file appender
    // flushes buffered lines.
    let _logger = match Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Logging setup error: {err:#}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init(args) => vigil::cli::commands::init::execute(args, &config, cli.json).await,
        Commands::Sweep(args) => {
            vigil::cli::commands::sweep::execute(args, &config, cli.json).await
        }
        Commands::Daemon(args) => {
            vigil::cli::commands::daemon::execute(args, &config, cli.json).await
        }
        Commands::Status(args) => {
            vigil::cli::commands::status::execute(args, &config, cli.json).await
        }
    };

    if let Err(err) = result {
        vigil::cli::handle_error(err, cli.json);
    }
}
