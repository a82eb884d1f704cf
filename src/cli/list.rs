//! `list` command.

use anyhow::Result;

use crate::cli::prompt::display_name;
use crate::config::PipelineConfig;
use crate::log;
use crate::pipeline::intake::discover_archives;
use crate::utils::plural_count;

/// Print the archives `run` would offer, numbered as in the selection prompt.
pub fn list_archives(config: &PipelineConfig) -> Result<()> {
    let paths = &config.paths;
    let archives = discover_archives(&paths.input, &paths.extension)?;

    log!("list"; "{} in {}", plural_count(archives.len(), "archive"), paths.input.display());
    for (i, archive) in archives.iter().enumerate() {
        let marker = if paths.archive_output(archive).exists() { " (processed)" } else { "" };
        println!("{:>3}. {}{}", i + 1, display_name(archive), marker);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_empty_dir_is_ok() {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::default();
        config.paths.input = dir.path().to_path_buf();
        assert!(list_archives(&config).is_ok());
    }

    #[test]
    fn test_list_missing_dir_errors() {
        let dir = TempDir::new().unwrap();
        let mut config = PipelineConfig::default();
        config.paths.input = dir.path().join("missing");
        assert!(list_archives(&config).is_err());
    }
}
