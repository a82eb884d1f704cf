//! Copying artifacts into the Anki media folder.

use std::fs;
use std::path::Path;

use super::composite::{Artifact, ArtifactKind};
use crate::log;

/// What happened when publishing one archive's artifacts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Published {
    /// File names copied into the media folder.
    pub copied: Vec<String>,
    /// File names that could not be copied, with the reason.
    pub failed: Vec<(String, String)>,
    /// First question composite produced, if any.
    pub question: Option<String>,
    /// First answer composite produced, if any.
    pub answer: Option<String>,
}

impl Published {
    /// Both halves of a question/answer pair exist.
    pub fn qa_pair(&self) -> Option<(&str, &str)> {
        Some((self.question.as_deref()?, self.answer.as_deref()?))
    }
}

/// Copy every artifact into `media_dir`, creating it if needed.
///
/// Existing files with the same name are overwritten. A failed copy is
/// recorded and the rest continue.
pub fn publish(artifacts: &[Artifact], media_dir: &Path) -> Published {
    let mut published = Published {
        question: first_of(artifacts, ArtifactKind::QuestionComposite),
        answer: first_of(artifacts, ArtifactKind::AnswerComposite),
        ..Default::default()
    };

    if let Err(e) = fs::create_dir_all(media_dir) {
        let reason = format!("cannot create {}: {}", media_dir.display(), e);
        log!("error"; "{}", reason);
        published.failed = artifacts
            .iter()
            .map(|a| (a.file_name(), reason.clone()))
            .collect();
        return published;
    }

    for artifact in artifacts {
        let name = artifact.file_name();
        match fs::copy(&artifact.path, media_dir.join(&name)) {
            Ok(_) => published.copied.push(name),
            Err(e) => {
                log!("error"; "cannot copy {} to media folder: {}", name, e);
                published.failed.push((name, e.to_string()));
            }
        }
    }

    published
}

fn first_of(artifacts: &[Artifact], kind: ArtifactKind) -> Option<String> {
    artifacts
        .iter()
        .find(|a| a.kind == kind)
        .map(Artifact::file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(dir: &Path, name: &str, kind: ArtifactKind) -> Artifact {
        let path = dir.join(name);
        fs::write(&path, name).unwrap();
        Artifact { path, kind }
    }

    #[test]
    fn test_publish_copies_and_tracks_pair() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("collection.media");
        let artifacts = vec![
            artifact(dir.path(), "base.png", ArtifactKind::BaseImage),
            artifact(dir.path(), "q1_composite.png", ArtifactKind::QuestionComposite),
            artifact(dir.path(), "q2_composite.png", ArtifactKind::QuestionComposite),
            artifact(dir.path(), "a_composite.png", ArtifactKind::AnswerComposite),
            artifact(dir.path(), "orig.png", ArtifactKind::Reference),
        ];

        let published = publish(&artifacts, &media);
        assert_eq!(published.copied.len(), 5);
        assert!(published.failed.is_empty());
        assert_eq!(
            published.qa_pair(),
            Some(("q1_composite.png", "a_composite.png"))
        );
        assert_eq!(fs::read_to_string(media.join("orig.png")).unwrap(), "orig.png");
    }

    #[test]
    fn test_publish_records_failures_and_continues() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("media");
        let artifacts = vec![
            Artifact {
                path: dir.path().join("vanished.png"),
                kind: ArtifactKind::Reference,
            },
            artifact(dir.path(), "ok.png", ArtifactKind::BaseImage),
        ];

        let published = publish(&artifacts, &media);
        assert_eq!(published.copied, vec!["ok.png".to_string()]);
        assert_eq!(published.failed.len(), 1);
        assert_eq!(published.failed[0].0, "vanished.png");
    }

    #[test]
    fn test_publish_overwrites_existing() {
        let dir = TempDir::new().unwrap();
        let media = dir.path().join("media");
        fs::create_dir(&media).unwrap();
        fs::write(media.join("x.png"), "old").unwrap();

        publish(&[artifact(dir.path(), "x.png", ArtifactKind::BaseImage)], &media);
        assert_eq!(fs::read_to_string(media.join("x.png")).unwrap(), "x.png");
    }

    #[test]
    fn test_qa_pair_requires_both() {
        let published = Published {
            question: Some("q.png".into()),
            ..Default::default()
        };
        assert_eq!(published.qa_pair(), None);
    }
}
