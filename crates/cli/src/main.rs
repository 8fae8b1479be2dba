//! hclaudit CLI — the main entry point.
//!
//! Commands:
//! - `serve`    — Start the dashboard server
//! - `chat`     — Ask questions from the terminal
//! - `doctor`   — Diagnose data files and credentials
//! - `status`   — Show the effective configuration
//! - `config`   — Show, locate or validate the config file
//! - `onboard`  — Write a default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hclaudit",
    about = "hclaudit — Asistente experto de cumplimiento para el tren de producción de HCl",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.toml (defaults to ~/.hclaudit/config.toml)
    #[arg(short, long, global = true, env = "HCLAUDIT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with the assistant in the terminal
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Diagnose data files, configuration and credentials
    Doctor,

    /// Show the effective configuration
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Write a default configuration file
    Onboard,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Chat { message } => commands::chat::run(config_path, message).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Status => commands::status::run(config_path).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
        },
        Commands::Onboard => commands::onboard::run(config_path).await?,
    }

    Ok(())
}
