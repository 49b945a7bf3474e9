//! Aural CLI
//!
//! Command-line front end for the aural positional audio library.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use aural::cli::{commands, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Aural v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Aural v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Play {
            files,
            at,
            listener,
            volume,
        } => commands::play(&files, at, listener, volume).context("play failed"),
        Commands::Bank { dir } => commands::bank(&dir)
            .with_context(|| format!("failed to load bank {}", dir.display())),
        Commands::Config { path, init } => commands::config(&path, init)
            .with_context(|| format!("invalid config {}", path.display())),
        Commands::Run { config } => commands::run(&config)
            .with_context(|| format!("failed to run {}", config.display())),
    }
}
