//! Stormspotter CLI - Command-line interface for Stormspotter
//!
//! Provides commands for:
//! - Collecting an AAD/ARM inventory into an archive (`collect`)
//! - Ingesting an archive into the property graph (`ingest`)
//! - Viewing and managing configuration
//! - Generating shell completions

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::collect::CollectCommand;
use commands::completions::CompletionsCommand;
use commands::config::ConfigCommand;
use commands::ingest::IngestCommand;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "stormspotter", version, about = "Azure AD/ARM reconnaissance collector and graph ingestor")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Collect an AAD/ARM inventory into an archive
    #[command(subcommand)]
    Collect(CollectCommand),
    /// Ingest an archive into the property graph
    Ingest(IngestCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    let config_path = cli.config.map(std::path::PathBuf::from);

    match cli.command {
        Commands::Collect(cmd) => cmd.execute(format, config_path).await,
        Commands::Ingest(cmd) => cmd.execute(format, config_path).await,
        Commands::Config(cmd) => cmd.execute(format).await,
        Commands::Completions(cmd) => cmd.execute(format).await,
    }
}
