//! Config command - manage configuration.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use patrep_core::{PatrepConfig, PatternMatcher};

use super::{Context, Status};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with default values
    Init(InitArgs),

    /// Show configuration file path
    Path,

    /// Check that every pattern is a valid regular expression
    Check,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, ctx: &Context) -> anyhow::Result<Status> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init(init_args) => init_config(init_args, ctx),
        ConfigCommand::Path => show_path(ctx),
        ConfigCommand::Check => check_config(ctx),
    }
}

/// Read the config file strictly; only a missing file falls back to defaults.
fn read_config(ctx: &Context) -> anyhow::Result<PatrepConfig> {
    if ctx.config_path.exists() {
        return Ok(PatrepConfig::from_file(&ctx.config_path)?);
    }

    println!(
        "{} No config file found, using defaults.",
        style("ℹ").blue()
    );
    Ok(PatrepConfig::default())
}

fn show_config(ctx: &Context) -> anyhow::Result<Status> {
    let config = read_config(ctx)?;
    print!("{}", config.to_toml()?);

    Ok(Status::Done)
}

fn init_config(args: InitArgs, ctx: &Context) -> anyhow::Result<Status> {
    let output_path = args.output.unwrap_or_else(|| ctx.config_path.clone());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    // Create parent directory if needed
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    PatrepConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(Status::Done)
}

fn show_path(ctx: &Context) -> anyhow::Result<Status> {
    println!("Configuration file: {}", ctx.config_path.display());

    if ctx.config_path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'patrep config init' to create a configuration file.");
    }

    Ok(Status::Done)
}

fn check_config(ctx: &Context) -> anyhow::Result<Status> {
    let config = read_config(ctx)?;
    let patterns = config.pattern_specs();

    PatternMatcher::new(&patterns)?;

    if patterns.is_empty() {
        println!("{} No patterns configured.", style("ℹ").yellow());
    }
    for pattern in &patterns {
        println!(
            "{} {}: {}",
            style("✓").green(),
            pattern.label(),
            pattern.expression
        );
    }
    println!(
        "Document folder: {}",
        config.scan_dir(&ctx.base_dir).display()
    );
    println!("Output format: {}", config.output_format);

    Ok(Status::Done)
}
