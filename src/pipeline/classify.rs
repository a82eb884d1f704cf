//! Manifest loading and media classification.
//!
//! An exported deck stores media under numeric names (`0`, `1`, ...) and a
//! JSON manifest `media` mapping those IDs to the original file names.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::{debug, log};

/// Manifest file name at the root of an extracted archive.
pub const MANIFEST_FILE: &str = "media";

const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const VECTOR_EXTENSIONS: &[&str] = &["svg"];

// ============================================================================
// Manifest
// ============================================================================

/// ID → original file name, in ascending numeric ID order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
}

impl Manifest {
    /// Parse manifest JSON. Values must all be strings.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let map: BTreeMap<String, String> = serde_json::from_str(content)?;
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by_key(|(id, _)| (id.parse::<u64>().is_err(), id.parse::<u64>().ok(), id.clone()));
        Ok(Self { entries })
    }

    /// Load the manifest from an extraction directory.
    ///
    /// A missing or unparsable manifest yields an empty mapping and a warning.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(MANIFEST_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                log!("warning"; "no manifest at {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match Self::parse(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                log!("warning"; "cannot parse manifest {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Roles and rules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaRole {
    BaseImage,
    QuestionMask,
    AnswerMask,
    ReferenceOriginal,
    Other,
}

impl fmt::Display for MediaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BaseImage => "base image",
            Self::QuestionMask => "question mask",
            Self::AnswerMask => "answer mask",
            Self::ReferenceOriginal => "reference original",
            Self::Other => "other",
        })
    }
}

/// One classification rule: extension set and optional name pattern → role.
pub struct ClassifyRule {
    extensions: Option<&'static [&'static str]>,
    name: Option<Regex>,
    role: MediaRole,
}

impl ClassifyRule {
    /// Match files by extension only.
    pub fn extension(extensions: &'static [&'static str], role: MediaRole) -> Self {
        Self {
            extensions: Some(extensions),
            name: None,
            role,
        }
    }

    /// Match files by extension and a case-insensitive substring of the name.
    pub fn extension_and_name(
        extensions: &'static [&'static str],
        needle: &str,
        role: MediaRole,
    ) -> Self {
        let pattern = format!("(?i){}", regex::escape(needle));
        Self {
            extensions: Some(extensions),
            name: Some(Regex::new(&pattern).expect("escaped literal is a valid pattern")),
            role,
        }
    }

    fn matches(&self, name: &str, extension: &str) -> bool {
        let ext_ok = self
            .extensions
            .is_none_or(|exts| exts.iter().any(|e| e.eq_ignore_ascii_case(extension)));
        let name_ok = self.name.as_ref().is_none_or(|re| re.is_match(name));
        ext_ok && name_ok
    }
}

/// Ordered rule list, first match wins, [`MediaRole::Other`] otherwise.
pub struct Classifier {
    rules: Vec<ClassifyRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(vec![
            ClassifyRule::extension(RASTER_EXTENSIONS, MediaRole::BaseImage),
            ClassifyRule::extension_and_name(VECTOR_EXTENSIONS, "ques", MediaRole::QuestionMask),
            ClassifyRule::extension_and_name(VECTOR_EXTENSIONS, "ans", MediaRole::AnswerMask),
            ClassifyRule::extension_and_name(
                VECTOR_EXTENSIONS,
                "orig",
                MediaRole::ReferenceOriginal,
            ),
        ])
    }
}

impl Classifier {
    pub fn new(rules: Vec<ClassifyRule>) -> Self {
        Self { rules }
    }

    /// Role for a file name.
    pub fn classify(&self, name: &str) -> MediaRole {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.rules
            .iter()
            .find(|rule| rule.matches(name, extension))
            .map_or(MediaRole::Other, |rule| rule.role)
    }
}

// ============================================================================
// Media set
// ============================================================================

/// An extracted file under its original name, with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub role: MediaRole,
}

impl MediaItem {
    /// File name without extension.
    pub fn stem(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Every classified item of one archive.
#[derive(Debug, Default)]
pub struct MediaSet {
    pub items: Vec<MediaItem>,
    /// Files copied to their proper name during this pass.
    pub copied: usize,
}

impl MediaSet {
    /// The compositing background: the first base image in manifest order.
    pub fn base_image(&self) -> Option<&MediaItem> {
        self.with_role(MediaRole::BaseImage).next()
    }

    pub fn with_role(&self, role: MediaRole) -> impl Iterator<Item = &MediaItem> {
        self.items.iter().filter(move |item| item.role == role)
    }

    pub fn count(&self, role: MediaRole) -> usize {
        self.with_role(role).count()
    }
}

/// Reject names that would land outside the extraction directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// Copy each ID-named file in `dir` to its original name and classify it.
///
/// Existing targets are not copied again, so repeated passes are cheap and
/// leave the directory unchanged.
pub fn classify_extracted(dir: &Path, manifest: &Manifest, classifier: &Classifier) -> MediaSet {
    let mut set = MediaSet::default();

    for (id, name) in manifest.iter() {
        if !is_plain_file_name(name) {
            log!("warning"; "skipping manifest entry {id}: unsafe file name `{name}`");
            continue;
        }

        let source = dir.join(id);
        let target = dir.join(name);

        if !source.is_file() {
            log!("warning"; "manifest entry {id} (`{name}`) has no extracted file");
            continue;
        }

        if target.exists() {
            debug!("classify"; "{name} already present");
        } else if let Err(e) = fs::copy(&source, &target) {
            log!("warning"; "cannot copy {id} to `{name}`: {e}");
            continue;
        } else {
            set.copied += 1;
        }

        let role = classifier.classify(name);
        debug!("classify"; "{name}: {role}");
        set.items.push(MediaItem {
            id: id.to_string(),
            name: name.to_string(),
            path: target,
            role,
        });
    }

    let bases = set.count(MediaRole::BaseImage);
    if bases > 1
        && let Some(base) = set.base_image()
    {
        log!("classify"; "{bases} base images found, compositing onto {}", base.name);
    }

    set
}
