//! CLI Module
//!
//! Command-line front end for driving audio chains against the software
//! engine.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Aural - functional positional audio
#[derive(Parser, Debug)]
#[command(name = "aural")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load WAV files and play each one once
    #[command(name = "play")]
    Play {
        /// WAV files to play
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emitter position as x,y,z
        #[arg(short, long, value_parser = parse_position, allow_hyphen_values = true)]
        at: Option<[f64; 3]>,

        /// Listener position as x,y,z
        #[arg(short, long, value_parser = parse_position, allow_hyphen_values = true)]
        listener: Option<[f64; 3]>,

        /// Master volume
        #[arg(long, default_value_t = 1.0)]
        volume: f32,
    },

    /// Load every WAV file in a directory and report decode status
    #[command(name = "bank")]
    Bank {
        /// Directory to scan
        dir: PathBuf,
    },

    /// Validate a config file, or write a default one with --init
    #[command(name = "config")]
    Config {
        /// Path to the config file
        path: PathBuf,

        /// Write the default config instead of validating
        #[arg(long)]
        init: bool,
    },

    /// Build a session from a config file and play every sound in it
    #[command(name = "run")]
    Run {
        /// Path to the config file
        config: PathBuf,
    },
}

/// Parse `x,y,z` into a position
pub fn parse_position(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got '{}'", s));
    }

    let mut position = [0.0; 3];
    for (slot, part) in position.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate '{}': {}", part, e))?;
    }
    Ok(position)
}
