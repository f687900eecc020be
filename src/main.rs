use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::Config;
use pantry::{Category, PantryClient, SessionContext, SessionEvent};

#[derive(Parser)]
#[command(name = "pantry")]
#[command(version)]
#[command(about = "Keep your kitchen inventory, recipes and meal plan on a pantry server", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account and sign in to it
    Register,

    /// Sign in with an existing access code
    Login {
        /// Access code, e.g. KITCH-AB23CD (case does not matter)
        token: String,
    },

    /// Forget the saved access code
    Logout,

    /// Show the server and sign-in state
    Status,

    /// Print a category as JSON
    Get {
        /// ingredients, recipes, shopping or mealplan
        category: Category,
    },

    /// Replace a category with the JSON in a file
    Put {
        /// ingredients, recipes, shopping or mealplan
        category: Category,
        /// JSON file to upload, or `-` for stdin
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    let config = Config::load(cli.config)?;
    execute(command, &config).await
}

/// Runs one command against the configured server and saves the resulting
/// sign-in state.
async fn execute(command: Commands, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = SessionContext::new(PantryClient::new(config.server_url.as_str()));
    let events = ctx.subscribe();

    let result = match command {
        Commands::Register => commands::register(&ctx).await,
        Commands::Login { token } => commands::login(&ctx, &token).await,
        Commands::Logout => commands::logout(&ctx, &config.session_path).await,
        Commands::Status => match commands::restore(&ctx, &config.session_path).await {
            Ok(()) => commands::status(&ctx, &config.server_url).await,
            Err(e) => Err(e),
        },
        Commands::Get { category } => match commands::restore(&ctx, &config.session_path).await {
            Ok(()) => commands::get(&ctx, category).await,
            Err(e) => Err(e),
        },
        Commands::Put { category, file } => {
            match commands::restore(&ctx, &config.session_path).await {
                Ok(()) => commands::put(&ctx, category, &file).await,
                Err(e) => Err(e),
            }
        }
    };

    // Closing the context ends the event stream.
    drop(ctx);
    let events: Vec<SessionEvent> = events.collect().await;
    commands::persist(&events, &config.session_path)?;

    result
}
