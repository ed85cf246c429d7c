//! testbridge CLI - Main Entry Point
//!
//! Converts test sources between Cypress, Playwright and TestRail,
//! detects the framework of existing files, and lists supported pairs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use testbridge_cli::commands::{convert, detect, pairs};
use testbridge_cli::config::{Config, DEFAULT_CONFIG_FILE};
use testbridge_cli::output::{self, OutputFormat};

/// testbridge - convert browser test suites between vocabularies
#[derive(Parser)]
#[command(name = "testbridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a test file to another framework
    Convert(convert::ConvertArgs),

    /// Detect the framework of files and directories
    Detect(detect::DetectArgs),

    /// List supported conversion pairs
    Pairs,
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Convert(args) => Ok(convert::execute(args, &config, cli.format)?.into()),
        Commands::Detect(args) => {
            detect::execute(args, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Pairs => {
            pairs::execute(cli.format);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::from(2)
        }
    }
}
