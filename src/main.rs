//! SARD Explorer CLI application
//!
//! Command-line interface for extracting flawed-line datasets from the SARD
//! manifest and exporting their statistics.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sard_explorer::cli::{
    handle_config, handle_export, handle_extract, handle_storage, handle_validate, Cli, Commands,
};
use sard_explorer::config::{AppConfig, LoggingConfig};
use sard_explorer::constants::logging::{CRATE_TARGET, DEFAULT_LEVEL};
use sard_explorer::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Configuration errors are reported by the command handlers
    let logging = AppConfig::load(cli.global.config.clone())
        .await
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(&cli, &logging);

    info!("SARD Explorer v{} starting", env!("CARGO_PKG_VERSION"));

    let global = &cli.global;
    match cli.command {
        Commands::Extract(args) => {
            info!("Executing extract command");
            handle_extract(global, args).await
        }
        Commands::Export(args) => {
            info!("Executing export command");
            handle_export(global, args).await
        }
        Commands::Validate(args) => {
            info!("Executing validate command");
            handle_validate(global, args).await.map(|_| ())
        }
        Commands::Storage => {
            info!("Executing storage command");
            handle_storage(global).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(global, args).await
        }
    }
}

/// Initialize logging from verbosity flags, RUST_LOG and the config file
fn init_logging(cli: &Cli, logging: &LoggingConfig) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = logging.filter_directives(cli.log_level(), rust_log.as_deref());

    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter '{}': {}", directives, e);
        EnvFilter::new(format!("{}={}", CRATE_TARGET, DEFAULT_LEVEL))
    });

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
