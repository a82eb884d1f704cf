//! `[convert]` section configuration.
//!
//! SVG rasterization and composite output settings.
//!
//! # Example
//!
//! ```toml
//! [convert]
//! converter = "inkscape"  # Rasterization backend: inkscape | rsvg
//! width = 1200            # Target pixel width (omit for the SVG's own size)
//! format = "png"          # Composite format: png | jpg | webp
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// SVG rasterization backend
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SvgConverter {
    /// Inkscape (`inkscape` command).
    #[default]
    Inkscape,
    /// librsvg (`rsvg-convert` command).
    Rsvg,
}

impl SvgConverter {
    /// Executable invoked for this backend.
    pub fn program(&self) -> &'static str {
        match self {
            Self::Inkscape => "inkscape",
            Self::Rsvg => "rsvg-convert",
        }
    }

    /// Install hint shown when the executable is missing.
    fn install_hint(&self) -> &'static str {
        match self {
            Self::Inkscape => "install Inkscape or set",
            Self::Rsvg => "install librsvg (rsvg-convert) or set",
        }
    }

    fn other(&self) -> &'static str {
        match self {
            Self::Inkscape => "rsvg",
            Self::Rsvg => "inkscape",
        }
    }
}

/// Composite output format
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompositeFormat {
    /// PNG format.
    #[default]
    PNG,
    /// JPEG format (no alpha channel).
    JPG,
    /// WebP format (lossless).
    WEBP,
}

impl CompositeFormat {
    /// Get file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::PNG => "png",
            Self::JPG => "jpg",
            Self::WEBP => "webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Conversion backend for rasterization.
    pub converter: SvgConverter,

    /// Target pixel width passed to the converter.
    pub width: Option<u32>,

    /// Output format for composites.
    pub format: CompositeFormat,
}

pub struct ConvertFields {
    pub converter: FieldPath,
    pub width: FieldPath,
    pub format: FieldPath,
}

impl ConvertConfig {
    pub const FIELDS: ConvertFields = ConvertFields {
        converter: FieldPath::new("convert.converter"),
        width: FieldPath::new("convert.width"),
        format: FieldPath::new("convert.format"),
    };
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            converter: SvgConverter::Inkscape,
            width: None,
            format: CompositeFormat::PNG,
        }
    }
}

impl ConvertConfig {
    /// Validate conversion configuration.
    ///
    /// # Checks
    /// - `width`, when set, must be positive
    /// - the converter executable must be installed
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.width == Some(0) {
            diag.error(Self::FIELDS.width, "width must be greater than zero");
        }

        let program = self.converter.program();
        if which::which(program).is_err() {
            diag.error_with_hint(
                Self::FIELDS.converter,
                format!("`{program}` command not found"),
                format!(
                    "{} {} = \"{}\"",
                    self.converter.install_hint(),
                    Self::FIELDS.converter.as_str(),
                    self.converter.other()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.convert.converter, SvgConverter::Inkscape);
        assert_eq!(config.convert.width, None);
        assert_eq!(config.convert.format, CompositeFormat::PNG);
    }

    #[test]
    fn test_converter_parsing() {
        let cases = [
            ("inkscape", SvgConverter::Inkscape),
            ("rsvg", SvgConverter::Rsvg),
        ];
        for (input, expected) in cases {
            let config = test_parse_config(&format!("[convert]\nconverter = \"{input}\""));
            assert_eq!(config.convert.converter, expected, "failed for {input}");
        }
    }

    #[test]
    fn test_format_parsing() {
        let config = test_parse_config("[convert]\nformat = \"jpg\"\nwidth = 800");
        assert_eq!(config.convert.format, CompositeFormat::JPG);
        assert_eq!(config.convert.width, Some(800));
    }

    #[test]
    fn test_program_names() {
        assert_eq!(SvgConverter::Inkscape.program(), "inkscape");
        assert_eq!(SvgConverter::Rsvg.program(), "rsvg-convert");
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(CompositeFormat::PNG.extension(), "png");
        assert_eq!(CompositeFormat::JPG.extension(), "jpg");
        assert_eq!(CompositeFormat::WEBP.extension(), "webp");
    }

    #[test]
    fn test_zero_width_rejected() {
        let config = ConvertConfig {
            width: Some(0),
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert!(
            diag.errors()
                .iter()
                .any(|e| e.field == ConvertConfig::FIELDS.width)
        );
    }
}
