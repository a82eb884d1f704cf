//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SvgConverter;

/// Anki image-occlusion media pipeline
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: ankimask.toml, searched upward from cwd)
    #[arg(short = 'C', long, global = true, default_value = "ankimask.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Extract, composite and publish media from exported decks
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// List archives found in the input directory
    #[command(visible_alias = "l")]
    List {
        #[command(flatten)]
        paths: PathArgs,
    },

    /// Write a default ankimask.toml into the current directory
    Init,
}

/// Directory overrides shared by `run` and `list`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PathArgs {
    /// Directory searched for archives
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub input: Option<PathBuf>,

    /// Parent directory for per-archive output
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Anki collection.media folder
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub media: Option<PathBuf>,
}

/// `run` command arguments
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// SVG rasterizer to use
    #[arg(short = 'c', long, value_enum)]
    pub converter: Option<SvgConverter>,

    /// Target pixel width for rasterized masks
    #[arg(short, long)]
    pub width: Option<u32>,

    /// Process every archive without asking
    #[arg(short, long)]
    pub all: bool,

    /// Overwrite existing output directories without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Leave archives with an existing output directory alone
    #[arg(short, long, conflicts_with = "yes")]
    pub skip_existing: bool,

    /// Only consider archives whose file name contains one of these
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,
}
