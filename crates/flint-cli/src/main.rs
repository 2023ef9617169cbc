//! Flint CLI - Command-line interface for the Flint engine

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{bindings, play};

#[derive(Parser)]
#[command(name = "flint")]
#[command(about = "Headless runner for the Flint engine core", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the demo scene headless until the quit binding fires
    Play {
        /// Path to an engine config file (TOML)
        #[arg(long)]
        config: Option<String>,

        /// Frame on which the quit key is pressed
        #[arg(long, default_value = "120")]
        frames: u32,

        /// Target frame rate override (0 = uncapped)
        #[arg(long)]
        fps: Option<f64>,

        /// Game speed override
        #[arg(long)]
        speed: Option<f64>,
    },

    /// Print the configured key bindings
    Bindings {
        /// Path to an engine config file (TOML)
        #[arg(long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            frames,
            fps,
            speed,
        } => play::run(play::PlayArgs {
            config,
            frames,
            fps,
            speed,
        }),
        Commands::Bindings { config } => bindings::run(config.as_deref()),
    }
}
