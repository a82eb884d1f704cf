//! `init` command.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, DEFAULT_CONFIG};
use crate::log;

/// Write the default config as `name` inside `root`.
///
/// Refuses to replace an existing file.
pub fn write_default_config(root: &Path, name: &Path) -> Result<PathBuf> {
    let path = root.join(name);
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path).into());
    }
    fs::write(&path, DEFAULT_CONFIG).map_err(|e| ConfigError::Io(path.clone(), e))?;
    log!("init"; "wrote {}", path.display());
    Ok(path)
}
