//! todolog CLI
//!
//! Command-line interface for the todolog event-sourced item store.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use todolog_core::{Config, Filter};

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "todolog")]
#[command(about = "todolog - an event-sourced to-do list")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new item
    Add {
        /// Item text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List items
    #[command(alias = "ls")]
    List {
        /// Which items to show (all, active, completed)
        #[arg(short, long, default_value = "all")]
        filter: Filter,
    },
    /// Mark an item done
    Done {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Mark an item not done
    Undo {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Replace an item's text
    Edit {
        /// Item ID (full or prefix)
        id: String,
        /// New text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove an item
    #[command(alias = "delete")]
    Rm {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Remove all completed items
    Clear,
    /// Show status (data file, counts)
    Status,
    /// Start an interactive shell
    Shell,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, input_capacity)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Add { text } => commands::item::add(&config, text, &output).await,
        Commands::List { filter } => commands::item::list(&config, filter, &output).await,
        Commands::Done { id } => commands::item::set_done(&config, id, true, &output).await,
        Commands::Undo { id } => commands::item::set_done(&config, id, false, &output).await,
        Commands::Edit { id, text } => commands::item::edit(&config, id, text, &output).await,
        Commands::Rm { id } => commands::item::remove(&config, id, &output).await,
        Commands::Clear => commands::item::clear(&config, &output).await,
        Commands::Status => commands::status::show(&config, &output).await,
        Commands::Shell => commands::shell::run(&config).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Initialize logging
///
/// Only initializes if TODOLOG_LOG is set. Logs go to `config.log_file`
/// when configured, stderr otherwise.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("TODOLOG_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "todolog_core={},todolog={}",
        log_level, log_level
    ));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };
            // Ignore error if already initialized
            let _ = builder
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
            info!("logging initialized to {:?}", log_path);
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
