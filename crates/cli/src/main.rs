//! Furnish CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! furnish-cli migrate
//!
//! # Load the demo catalog
//! furnish-cli seed catalog
//!
//! # Top up a shopper's balance
//! furnish-cli balance set -e shopper@example.com -a 2500
//!
//! # Drop expired API tokens
//! furnish-cli tokens purge
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string
//!   (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "furnish-cli")]
#[command(author, version, about = "Furnish CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the database with demo data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage shopper balances
    Balance {
        #[command(subcommand)]
        action: BalanceAction,
    },
    /// Manage API tokens
    Tokens {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert the demo categories and products
    Catalog,
}

#[derive(Subcommand)]
enum BalanceAction {
    /// Overwrite a shopper's balance
    Set {
        /// Shopper email address
        #[arg(short, long)]
        email: String,

        /// New balance in dollars, e.g. `1000` or `249.99`
        #[arg(short, long)]
        amount: String,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Delete expired bearer tokens
    Purge,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Catalog => commands::seed::catalog().await?,
        },
        Commands::Balance { action } => match action {
            BalanceAction::Set { email, amount } => {
                commands::balance::set(&email, &amount).await?;
            }
        },
        Commands::Tokens { action } => match action {
            TokenAction::Purge => commands::tokens::purge().await?,
        },
    }
    Ok(())
}
