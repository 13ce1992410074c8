/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! stache CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "stache")]
#[command(version)]
#[command(about = "Resolve template statements against a stache environment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refine every statement in a fixture and print what it resolved to
    Resolve {
        /// JSON fixture with registry entries and statements
        fixture: PathBuf,

        /// TOML file with environment settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print cache statistics after resolving
        #[arg(long)]
        stats: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "stache=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            fixture,
            config,
            stats,
        } => commands::resolve::execute(commands::resolve::ResolveArgs {
            fixture,
            config,
            stats,
        }),
    }
}
