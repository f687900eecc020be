//! Pantry Admin CLI
//!
//! Administration tool for accounts in the server's SQLite database.
//!
//! # Usage
//!
//! ```bash
//! pantry-admin account create
//! pantry-admin account list
//! pantry-admin account show KITCH-AB23CD
//! ```
//!
//! The database path comes from `--database`, or else the server
//! configuration (`PANTRY_DATABASE_PATH`, `PANTRY_CONFIG`).

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use pantry::server::ServerConfig;
use pantry::{SqliteStore, UserDirectory};

#[derive(Parser)]
#[command(name = "pantry-admin")]
#[command(version)]
#[command(about = "Pantry server administration tool")]
struct Cli {
    /// SQLite database to operate on
    #[arg(long, short, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage accounts
    Account(AccountCommand),
}

#[derive(Args)]
struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Subcommand)]
enum AccountSubcommand {
    /// Create a new account and print its token
    Create,
    /// List all accounts
    List,
    /// Show one account
    Show {
        /// Account token
        token: String,
    },
}

async fn open_directory(database: Option<PathBuf>) -> Result<UserDirectory, Box<dyn std::error::Error>> {
    let path = match database {
        Some(path) => path,
        None => ServerConfig::load(None)?.database_path,
    };
    let store = SqliteStore::open(&path).await?;
    Ok(UserDirectory::new(Arc::new(store)))
}

async fn create_account(directory: &UserDirectory) -> Result<(), Box<dyn std::error::Error>> {
    let account = directory.register().await?;

    println!("Created account: {}", account.token);
    println!("  Created: {}", account.created_at.to_rfc3339());

    Ok(())
}

async fn list_accounts(directory: &UserDirectory) -> Result<(), Box<dyn std::error::Error>> {
    let accounts = directory.list().await?;

    if accounts.is_empty() {
        println!("No accounts registered.");
        return Ok(());
    }

    println!("{:<16} {:<30}", "TOKEN", "CREATED");
    println!("{}", "-".repeat(46));

    for account in &accounts {
        println!(
            "{:<16} {:<30}",
            account.token,
            account.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    println!();
    println!("Total: {} account(s)", accounts.len());

    Ok(())
}

async fn show_account(
    directory: &UserDirectory,
    token: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let account = directory
        .authenticate(token)
        .await
        .map_err(|e| format!("Account '{}' not found: {}", token, e))?;

    println!("Token: {}", account.token);
    println!("  Created: {}", account.created_at.to_rfc3339());

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match open_directory(cli.database).await {
        Ok(directory) => match cli.command {
            Commands::Account(account_cmd) => match account_cmd.command {
                AccountSubcommand::Create => create_account(&directory).await,
                AccountSubcommand::List => list_accounts(&directory).await,
                AccountSubcommand::Show { token } => show_account(&directory, &token).await,
            },
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
