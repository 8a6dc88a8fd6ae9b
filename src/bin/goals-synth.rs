// Copyright (c) 2025 - Cowboy AI, Inc.
//! Goals Infrastructure Synthesizer
//!
//! Loads the configuration for one environment, assembles the resource graph
//! and writes the deployment descriptor as JSON.
//!
//! Run with: cargo run --bin goals-synth -- --environment dev --config-dir config
//!
//! Settings are read from the process environment first, then from
//! `<config-dir>/.env.<environment>`. Logging is controlled by `RUST_LOG`.

use anyhow::{Context, Result};
use clap::Parser;
use goals_infrastructure::{synthesize_environment, EnvSource, FileSource, LayeredSource};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "goals-synth", version, about = "Synthesize the goals deployment descriptor")]
struct Args {
    /// Environment to synthesize (dev, staging, prod, ...)
    #[arg(short, long, env = "ENVIRONMENT")]
    environment: String,

    /// Directory holding the `.env.<environment>` files
    #[arg(short, long, default_value = ".")]
    config_dir: PathBuf,

    /// Write the descriptor here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read settings from the process environment only
    #[arg(long)]
    env_only: bool,
}

fn run(args: &Args) -> Result<()> {
    let mut source = LayeredSource::new().layer(EnvSource);
    if !args.env_only {
        let file = FileSource::for_environment(&args.config_dir, &args.environment)
            .context("Failed to read settings file")?;
        source = source.layer(file);
    }

    let descriptor = synthesize_environment(&args.environment, &source)
        .with_context(|| format!("Failed to synthesize environment {}", args.environment))?;
    let json = descriptor.to_json().context("Failed to serialize descriptor")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                "Wrote {} resources for stack {} to {}",
                descriptor.resources.len(),
                descriptor.stack_name,
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the descriptor
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("Synthesizing environment {}", args.environment);

    if let Err(e) = run(&args) {
        error!("Synthesis failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
