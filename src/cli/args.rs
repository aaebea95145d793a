//! Command-line interface definitions.

use clap::{Args, ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Production asset pipeline for static sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: revline.toml)
    #[arg(short = 'C', long, default_value = "revline.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Clean the output root and run every stage for production
    #[command(visible_alias = "p")]
    Prod {
        #[command(flatten)]
        args: ProdArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProdArgs {
    /// Output root, overriding `output` in the config (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl Cli {
    pub fn prod_args(&self) -> &ProdArgs {
        match &self.command {
            Commands::Prod { args } => args,
        }
    }
}
