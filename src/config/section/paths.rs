//! `[paths]` section configuration.
//!
//! Where archives are found and where results go.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! input = "~/Downloads"          # Directory searched for exported decks
//! extension = "apkg"             # Archive extension (case-insensitive)
//! output = "~/anki-occlusion"    # Parent of the per-archive output directories
//! media = "~/.local/share/Anki2/User 1/collection.media"
//! ```
//!
//! Relative paths are resolved against the directory holding `ankimask.toml`;
//! a leading `~` expands to the home directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::util::resolve_path;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory searched for archives.
    pub input: PathBuf,

    /// Archive file extension, without the dot.
    pub extension: String,

    /// Parent directory for per-archive output directories.
    pub output: PathBuf,

    /// Anki `collection.media` folder.
    pub media: PathBuf,
}

pub struct PathsFields {
    pub input: FieldPath,
    pub extension: FieldPath,
    pub output: FieldPath,
    pub media: FieldPath,
}

impl PathsConfig {
    pub const FIELDS: PathsFields = PathsFields {
        input: FieldPath::new("paths.input"),
        extension: FieldPath::new("paths.extension"),
        output: FieldPath::new("paths.output"),
        media: FieldPath::new("paths.media"),
    };
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("~/Downloads"),
            extension: "apkg".to_string(),
            output: PathBuf::from("~/anki-occlusion"),
            media: PathBuf::from("~/.local/share/Anki2/User 1/collection.media"),
        }
    }
}

impl PathsConfig {
    /// Expand `~` and resolve relative paths against `root`.
    pub fn normalize(&mut self, root: &Path) {
        self.input = resolve_path(&self.input, root);
        self.output = resolve_path(&self.output, root);
        self.media = resolve_path(&self.media, root);
        self.extension = self
            .extension
            .trim()
            .trim_start_matches('.')
            .to_ascii_lowercase();
    }

    /// Output directory for one archive, named after its file stem.
    pub fn archive_output(&self, archive: &Path) -> PathBuf {
        let stem = archive
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string());
        self.output.join(stem)
    }

    /// Validate paths configuration.
    ///
    /// # Checks
    /// - `input` must be an existing directory
    /// - `extension` must not be empty
    /// - `output` and `media` must not point at an existing regular file
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.input.is_dir() {
            diag.error_with_hint(
                Self::FIELDS.input,
                format!("`{}` is not a directory", self.input.display()),
                "point it at the folder your exported decks are saved to",
            );
        }

        if self.extension.is_empty() {
            diag.error(Self::FIELDS.extension, "archive extension must not be empty");
        }

        for (field, path) in [(Self::FIELDS.output, &self.output), (Self::FIELDS.media, &self.media)]
        {
            if path.is_file() {
                diag.error(field, format!("`{}` is a file, expected a directory", path.display()));
            }
        }
    }
}
