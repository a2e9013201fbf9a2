//! Flagstone CLI - database migrations, catalog seeding and postcode import.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! flagstone-cli migrate storefront
//!
//! # Run delivery database migrations
//! flagstone-cli migrate delivery
//!
//! # Run all database migrations
//! flagstone-cli migrate all
//!
//! # Load categories and products from YAML
//! flagstone-cli seed catalog data/catalog.yaml
//!
//! # Import delivery prices from a directory of CSV files
//! flagstone-cli import-postcodes data/postcodes
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "flagstone-cli")]
#[command(author, version, about = "Flagstone CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Import delivery prices from every CSV file in a directory
    ImportPostcodes {
        /// Directory containing `Postcode,Economy,Premium` CSV files
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Run storefront database migrations
    Storefront,
    /// Run delivery database migrations
    Delivery,
    /// Run all database migrations
    All,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert categories and products from a YAML file
    Catalog {
        /// Path to the YAML file (a list of categories)
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Delivery => commands::migrate::delivery().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::delivery().await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Catalog { file } => commands::seed::catalog(&file).await?,
        },
        Commands::ImportPostcodes { dir } => {
            let summary = commands::import_postcodes::run(&dir).await?;
            tracing::info!(
                files = summary.files,
                failed_files = summary.failed_files,
                imported = summary.imported,
                invalid = summary.invalid,
                "Postcode import finished"
            );
        }
    }
    Ok(())
}
