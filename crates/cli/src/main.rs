//! Cartwheel CLI - Database migrations and catalog seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront database migrations
//! cw-cli migrate
//!
//! # Load the default catalog
//! cw-cli seed
//!
//! # Load a catalog from a YAML file
//! cw-cli seed --file crates/cli/seed/items.yaml
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL`, falling back to
//! `DATABASE_URL`. A `.env` file is loaded if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(author, version, about = "Cartwheel CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Insert or update catalog items
    Seed {
        /// YAML file with an `items` list; the built-in catalog if omitted
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await,
        Commands::Seed { file } => commands::seed::items(file.as_deref()).await,
    }
}
