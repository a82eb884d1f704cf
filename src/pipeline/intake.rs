//! Archive discovery, output directory preparation and extraction.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

/// Name of the scratch directory inside an archive's output directory.
pub const SCRATCH_DIR: &str = "_extracted";

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("archive `{0}` not found")]
    Missing(PathBuf),

    #[error("cannot open `{0}`")]
    Open(PathBuf, #[source] io::Error),

    #[error("`{0}` is not a valid archive")]
    Corrupt(PathBuf, #[source] zip::result::ZipError),

    #[error("entry `{0}` escapes the extraction directory")]
    UnsafeEntry(String),

    #[error("failed to write `{0}`")]
    Write(PathBuf, #[source] io::Error),
}

/// Archives in `dir` with the given extension, sorted by file name.
pub fn discover_archives(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("cannot read `{}`", dir.display()))?;

    let mut archives: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_extension(path, extension))
        .collect();
    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(archives)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Make `dir` an empty directory.
///
/// If it already exists, `confirm` decides whether it may be wiped.
/// Returns `false` when the user declined.
pub fn prepare_output_dir(dir: &Path, confirm: impl FnOnce(&Path) -> Result<bool>) -> Result<bool> {
    if dir.exists() {
        if !confirm(dir)? {
            return Ok(false);
        }
        fs::remove_dir_all(dir).with_context(|| format!("cannot remove `{}`", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("cannot create `{}`", dir.display()))?;
    Ok(true)
}

/// Unpack every entry of `archive` into `dest`.
///
/// On failure the partially written `dest` is removed.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize, IntakeError> {
    let result = extract_entries(archive, dest);
    if result.is_err() && dest.exists() {
        let _ = fs::remove_dir_all(dest);
    }
    result
}

fn extract_entries(archive: &Path, dest: &Path) -> Result<usize, IntakeError> {
    if !archive.is_file() {
        return Err(IntakeError::Missing(archive.to_path_buf()));
    }

    let file = File::open(archive).map_err(|e| IntakeError::Open(archive.to_path_buf(), e))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| IntakeError::Corrupt(archive.to_path_buf(), e))?;

    fs::create_dir_all(dest).map_err(|e| IntakeError::Write(dest.to_path_buf(), e))?;

    let mut count = 0;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| IntakeError::Corrupt(archive.to_path_buf(), e))?;

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| IntakeError::UnsafeEntry(entry.name().to_string()))?;
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| IntakeError::Write(target.clone(), e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| IntakeError::Write(parent.to_path_buf(), e))?;
        }
        let mut out = File::create(&target).map_err(|e| IntakeError::Write(target.clone(), e))?;
        io::copy(&mut entry, &mut out).map_err(|e| IntakeError::Write(target.clone(), e))?;
        count += 1;
    }

    Ok(count)
}

/// Scratch directory removed when dropped, whatever happened in between.
pub struct ScratchDir(PathBuf);

impl ScratchDir {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.0.exists()
            && let Err(e) = fs::remove_dir_all(&self.0)
        {
            crate::log!("warning"; "cannot remove scratch directory {}: {}", self.0.display(), e);
        }
    }
}
