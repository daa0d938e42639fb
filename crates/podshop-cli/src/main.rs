mod stock;
mod variants;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::stock::LookupError;

#[derive(Debug, Parser)]
#[command(name = "podshop-cli")]
#[command(about = "Storefront catalog and stock inspection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print combinations and inventory totals for a product
    Stock {
        /// Product route or slug; defaults to the first product whose route
        /// contains "cap"
        slug: Option<String>,
    },
    /// Print the grouped variant catalog for a product
    Variants {
        /// Product route or slug
        slug: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), LookupError> {
    let config = podshop_core::load_app_config().map_err(LookupError::Config)?;
    init_tracing(&config.log_level);

    let client = podshop_backend::BackendClient::from_config(&config)
        .map_err(|e| LookupError::Unexpected(e.into()))?;

    match cli.command {
        Commands::Stock { slug } => stock::run_stock(&client, slug.as_deref()).await,
        Commands::Variants { slug } => variants::run_variants(&client, &slug).await,
    }
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
