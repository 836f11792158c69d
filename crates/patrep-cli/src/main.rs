//! CLI application for PDF pattern reports.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use tracing::error;

use commands::{config, scan, Context};

/// Search a folder of PDFs for regular expressions and write an Excel report
#[derive(Parser)]
#[command(name = "patrep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base folder for documents, reports, logs, and config [default: current folder]
    #[arg(short, long, global = true)]
    base_dir: Option<PathBuf>,

    /// Path to config file [default: <base>/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan PDF files and write a match report
    Scan(scan::ScanArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("{} Cannot determine current folder: {}", style("✗").red(), e);
                return ExitCode::from(2);
            }
        },
    };
    let ctx = Context::new(base_dir, cli.config);

    logging::init(cli.verbose, &ctx.logs_dir());

    let result = match cli.command {
        Commands::Scan(args) => scan::run(args, &ctx),
        Commands::Config(args) => config::run(args, &ctx),
    };

    match result {
        Ok(status) => status.into(),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(2)
        }
    }
}
