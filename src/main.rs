//! Revline - production asset pipeline for static sites.

mod asset;
mod cli;
mod config;
mod error;
mod logger;
mod manifest;
mod pipeline;
mod rewrite;
mod stage;
mod transform;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, prod::run_prod};
use config::PipelineConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Prod { args } => {
            logger::set_verbose(args.verbose);
            let config = PipelineConfig::load(&cli)?;
            run_prod(&config).map(|_| ())
        }
    }
}
