//! Pipeline configuration management for `ankimask.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths]
//! │   ├── convert    # [convert]
//! │   └── report     # [report]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The config is loaded once, overridden by CLI flags, validated, and then
//! passed by reference into the pipeline. Nothing reads it from global state.

pub mod section;
pub mod types;
mod util;

pub use section::{CompositeFormat, ConvertConfig, PathsConfig, ReportConfig, SvgConverter};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands, PathArgs},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::{find_config_file, resolve_path};

/// Default config file contents written by `ankimask init`.
pub const DEFAULT_CONFIG: &str = r#"[paths]
input = "~/Downloads"
extension = "apkg"
output = "~/anki-occlusion"
media = "~/.local/share/Anki2/User 1/collection.media"

[convert]
converter = "inkscape"  # inkscape | rsvg
# width = 1200
format = "png"          # png | jpg | webp

[report]
editor = ["code"]
"#;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing ankimask.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Input, output and media folders
    #[serde(default)]
    pub paths: PathsConfig,

    /// Rasterizer settings
    #[serde(default)]
    pub convert: ConvertConfig,

    /// Report settings
    #[serde(default)]
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Load configuration for the given command line.
    ///
    /// Searches upward from cwd for the config file; a missing file means
    /// built-in defaults rooted at cwd.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                crate::debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or_default();
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "`{}` not found, using defaults", cli.config.display());
                Self {
                    root: cwd.clone(),
                    ..Self::default()
                }
            }
        };

        let root = config.root.clone();
        config.paths.normalize(&root);
        config.apply_command_options(cli, &cwd);
        config.validate(&cli.command)?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {} ignored: {}", path.display(), ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    ///
    /// CLI paths are relative to the current directory, not the config root.
    fn apply_command_options(&mut self, cli: &Cli, cwd: &Path) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Run { args } => {
                self.apply_path_args(&args.paths, cwd);
                Self::update_option(&mut self.convert.converter, args.converter.as_ref());
                if args.width.is_some() {
                    self.convert.width = args.width;
                }
            }
            Commands::List { paths } => self.apply_path_args(paths, cwd),
            Commands::Init => {}
        }
    }

    fn apply_path_args(&mut self, args: &PathArgs, cwd: &Path) {
        if let Some(input) = &args.input {
            self.paths.input = resolve_path(input, cwd);
        }
        if let Some(output) = &args.output {
            self.paths.output = resolve_path(output, cwd);
        }
        if let Some(media) = &args.media {
            self.paths.media = resolve_path(media, cwd);
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, command: &Commands) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        match command {
            Commands::Run { .. } => {
                self.paths.validate(&mut diag);
                self.convert.validate(&mut diag);
                self.report.validate(&mut diag);
            }
            Commands::List { .. } => self.paths.validate(&mut diag),
            Commands::Init => {}
        }

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

/// Parse a config string for tests, panicking on invalid TOML.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    PipelineConfig::from_str(content).expect("test config should parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = test_parse_config(DEFAULT_CONFIG);
        assert_eq!(config.paths.extension, "apkg");
        assert_eq!(config.convert.converter, SvgConverter::Inkscape);
        assert_eq!(config.report.editor, vec!["code".to_string()]);
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (config, ignored) =
            PipelineConfig::parse_with_ignored("[convert]\nconverter = \"rsvg\"\ndpi = 96\n")
                .unwrap();
        assert_eq!(config.convert.converter, SvgConverter::Rsvg);
        assert_eq!(ignored, vec!["convert.dpi".to_string()]);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(PipelineConfig::from_str("[convert\nconverter = 1").is_err());
        assert!(PipelineConfig::from_str("[convert]\nconverter = \"magick\"").is_err());
    }

    #[test]
    fn test_update_option() {
        let mut converter = SvgConverter::Inkscape;
        PipelineConfig::update_option(&mut converter, None);
        assert_eq!(converter, SvgConverter::Inkscape);
        PipelineConfig::update_option(&mut converter, Some(&SvgConverter::Rsvg));
        assert_eq!(converter, SvgConverter::Rsvg);
    }

    #[test]
    fn test_path_args_resolve_against_cwd() {
        let mut config = PipelineConfig::default();
        let args = PathArgs {
            input: Some(PathBuf::from("decks")),
            output: None,
            media: Some(PathBuf::from("/media")),
        };
        config.apply_path_args(&args, Path::new("/work"));
        assert_eq!(config.paths.input, PathBuf::from("/work/decks"));
        assert_eq!(config.paths.media, PathBuf::from("/media"));
        assert_eq!(config.paths.output, PathBuf::from("~/anki-occlusion"));
    }
}
