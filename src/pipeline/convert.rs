//! SVG rasterization through an external converter.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{ConvertConfig, SvgConverter};
use crate::utils::exec::{Cmd, FilterRule};

/// Inkscape prints GTK and font-cache chatter on stderr even on success.
static INKSCAPE_FILTER: FilterRule = FilterRule::new(&["Gtk-", "(inkscape:", "Fontconfig", "Background RRGGBBAA"]);

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("`{0}` is not installed")]
    ToolMissing(&'static str),

    #[error("conversion failed: {0}")]
    Failed(String),

    #[error("converter produced no file at `{0}`")]
    NoOutput(PathBuf),
}

/// Turns an SVG file into a PNG file.
pub trait Rasterize {
    fn rasterize(&self, svg: &Path, png: &Path) -> Result<(), ConvertError>;
}

/// Rasterizer backed by `inkscape` or `rsvg-convert`.
#[derive(Debug, Clone)]
pub struct ExternalRasterizer {
    converter: SvgConverter,
    width: Option<u32>,
}

impl ExternalRasterizer {
    pub fn new(converter: SvgConverter, width: Option<u32>) -> Self {
        Self { converter, width }
    }

    pub fn from_config(config: &ConvertConfig) -> Self {
        Self::new(config.converter, config.width)
    }

    /// Command line converting `svg` into `png`.
    fn command(&self, svg: &Path, png: &Path) -> Cmd {
        let width = self.width.map(|w| w.to_string());
        match self.converter {
            SvgConverter::Inkscape => Cmd::new(self.converter.program())
                .arg(svg)
                .arg("--export-type=png")
                .arg(format!("--export-filename={}", png.display()))
                .args(width.map(|w| format!("--export-width={w}")))
                .filter(&INKSCAPE_FILTER),
            SvgConverter::Rsvg => Cmd::new(self.converter.program())
                .args(width.iter().flat_map(|w| ["-w", w.as_str()]))
                .args(["-f", "png", "-o"])
                .arg(png)
                .arg(svg),
        }
    }
}

impl Rasterize for ExternalRasterizer {
    fn rasterize(&self, svg: &Path, png: &Path) -> Result<(), ConvertError> {
        let program = self.converter.program();
        if which::which(program).is_err() {
            return Err(ConvertError::ToolMissing(program));
        }

        let cmd = self.command(svg, png);
        crate::debug!("convert"; "{}", cmd.display());
        cmd.run()
            .map_err(|e| ConvertError::Failed(format!("{e:#}")))?;

        if !png.is_file() {
            return Err(ConvertError::NoOutput(png.to_path_buf()));
        }
        Ok(())
    }
}
