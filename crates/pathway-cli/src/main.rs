//! Pathway CLI - sign in to Hajj Pathway and inspect the resolved session.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::Pathway;
use pathway_auth::Role;
use pathway_config_and_utils::{init_logging, Config, Paths};
use std::time::Duration;
use tracing::debug;

/// Pathway CLI - Manage your Hajj Pathway session.
#[derive(Parser)]
#[command(name = "pathway")]
#[command(about = "Pathway CLI for authentication and role inspection")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    Signup {
        #[arg(short, long)]
        email: String,
        /// Public display name
        #[arg(short, long)]
        username: String,
        /// Account type (pilgrim, agent, admin)
        #[arg(short, long, default_value = "pilgrim")]
        role: Role,
    },

    /// Logout and clear session
    Logout,

    /// Show the resolved session and role
    Status,

    /// Print the session state whenever it changes
    Watch {
        /// Seconds between stored-session checks
        #[arg(short, long, default_value = "60")]
        interval: u64,
    },
}

async fn run(cli: Cli, config: Config, paths: Paths) -> anyhow::Result<()> {
    let pathway = Pathway::connect(&config, &paths)?;
    let format = &cli.format;

    match cli.command {
        Commands::Login { email } => commands::login(&pathway, email, format).await,
        Commands::Signup {
            email,
            username,
            role,
        } => commands::signup(&pathway, &email, &username, role, format).await,
        Commands::Logout => commands::logout(&pathway, format).await,
        Commands::Status => commands::status(&pathway, format).await,
        Commands::Watch { interval } => {
            let interval = Duration::from_secs(interval.max(1));
            commands::watch(&pathway, interval, format).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    let loaded = Paths::new().and_then(|paths| Config::load(&paths).map(|config| (paths, config)));
    let (paths, config) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            output::print_error(&format!("Failed to load configuration: {}", e), &format);
            std::process::exit(1);
        }
    };

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging("pathway-cli", &level, false);
    debug!(base_dir = %paths.base_dir().display(), "Configuration loaded");

    if let Err(e) = run(cli, config, paths).await {
        output::print_error(&format!("{:#}", e), &format);
        std::process::exit(1);
    }
}
