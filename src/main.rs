//! ankimask - Turn Anki image-occlusion exports into ready-to-use media.

mod cli;
mod config;
mod logger;
mod pipeline;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PipelineConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Init => {
            let cwd = std::env::current_dir()?;
            cli::init::write_default_config(&cwd, &cli.config).map(|_| ())
        }
        Commands::Run { args } => cli::run::run_pipeline(args, &PipelineConfig::load(&cli)?),
        Commands::List { .. } => cli::list::list_archives(&PipelineConfig::load(&cli)?),
    }
}
