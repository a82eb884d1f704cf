//! Per-archive processing pipeline.
//!
//! ```text
//! Selected ─▶ Extracted ─▶ Classified ─▶ Composited ─▶ Published ─▶ Reported ─▶ Done
//!    │            │
//!    ▼            ▼
//! Skipped   FailedExtraction
//! ```
//!
//! | Module      | Stage                                              |
//! |-------------|----------------------------------------------------|
//! | `intake`    | discover, prepare output dir, unpack               |
//! | `classify`  | manifest → named files → roles                     |
//! | `convert`   | SVG → PNG via external converter                   |
//! | `composite` | mask over base image                               |
//! | `publish`   | copy into the Anki media folder                    |
//! | `report`    | `_image_paths.txt`, `_joplin_qa_paths.txt`         |
//!
//! Archives are processed one after another. Nothing that goes wrong with
//! one archive stops the next.

pub mod classify;
pub mod composite;
pub mod convert;
pub mod intake;
pub mod publish;
pub mod report;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::prompt::{ask_overwrite, display_name};
use crate::config::PipelineConfig;
use crate::utils::{plural_count, plural_s};
use crate::{debug, log};

use classify::{Classifier, Manifest, MediaRole, classify_extracted};
use composite::Compositor;
use convert::Rasterize;
use intake::{SCRATCH_DIR, ScratchDir, extract_archive, prepare_output_dir};
use publish::publish;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    Selected,
    Extracted,
    Classified,
    Composited,
    Published,
    Reported,
    Done,
    /// User declined to overwrite the existing output directory.
    Skipped,
    FailedExtraction,
}

impl ArchiveState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::FailedExtraction)
    }
}

impl fmt::Display for ArchiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Selected => "selected",
            Self::Extracted => "extracted",
            Self::Classified => "classified",
            Self::Composited => "composited",
            Self::Published => "published",
            Self::Reported => "reported",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::FailedExtraction => "extraction failed",
        })
    }
}

/// How to treat an output directory that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    Prompt,
    Always,
    /// Keep the existing directory and skip the archive.
    Never,
}

/// Where one archive ended up.
#[derive(Debug)]
pub struct ArchiveOutcome {
    pub archive: PathBuf,
    pub state: ArchiveState,
    /// Artifact file names listed in the report.
    pub artifacts: Vec<String>,
    /// Snippet written for a question/answer pair.
    pub qa_snippet: Option<PathBuf>,
}

impl ArchiveOutcome {
    fn new(archive: &Path) -> Self {
        Self {
            archive: archive.to_path_buf(),
            state: ArchiveState::Selected,
            artifacts: Vec::new(),
            qa_snippet: None,
        }
    }

    fn advance(&mut self, next: ArchiveState) {
        debug!("archive"; "{}: {} -> {}", display_name(&self.archive), self.state, next);
        self.state = next;
    }
}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ArchiveOutcome>,
}

impl RunSummary {
    pub fn count(&self, state: ArchiveState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn log(&self) {
        let done = self.count(ArchiveState::Done);
        let skipped = self.count(ArchiveState::Skipped);
        let failed = self.count(ArchiveState::FailedExtraction);
        let images: usize = self.outcomes.iter().map(|o| o.artifacts.len()).sum();
        log!(
            "done";
            "{} processed, {} image{} published, {} skipped, {} failed",
            plural_count(done, "archive"),
            images,
            plural_s(images),
            skipped,
            failed
        );
    }
}

/// The configured pipeline.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    rasterizer: &'a dyn Rasterize,
    classifier: Classifier,
    overwrite: Overwrite,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, rasterizer: &'a dyn Rasterize, overwrite: Overwrite) -> Self {
        Self {
            config,
            rasterizer,
            classifier: Classifier::default(),
            overwrite,
        }
    }

    /// Process `archives` in order.
    pub fn run(&self, archives: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        for (i, archive) in archives.iter().enumerate() {
            log!("archive"; "[{}/{}] {}", i + 1, archives.len(), display_name(archive));
            let outcome = self.process(archive);
            debug_assert!(outcome.state.is_terminal());
            summary.outcomes.push(outcome);
        }
        summary
    }

    /// Run one archive through every stage.
    pub fn process(&self, archive: &Path) -> ArchiveOutcome {
        let mut outcome = ArchiveOutcome::new(archive);
        let name = display_name(archive);
        let out_dir = self.config.paths.archive_output(archive);

        match self.prepare(&out_dir) {
            Ok(true) => {}
            Ok(false) => {
                log!("archive"; "skipping {}", name);
                outcome.advance(ArchiveState::Skipped);
                return outcome;
            }
            Err(e) => {
                log!("error"; "{}: {:#}", name, e);
                outcome.advance(ArchiveState::Skipped);
                return outcome;
            }
        }

        let scratch = ScratchDir::new(out_dir.join(SCRATCH_DIR));
        match extract_archive(archive, scratch.path()) {
            Ok(count) => {
                debug!("extract"; "{} entries from {}", count, name);
                outcome.advance(ArchiveState::Extracted);
            }
            Err(e) => {
                log!("error"; "{:#}", anyhow::Error::from(e));
                // Only succeeds if nothing else was written there
                let _ = fs::remove_dir(&out_dir);
                outcome.advance(ArchiveState::FailedExtraction);
                return outcome;
            }
        }

        let manifest = Manifest::load(scratch.path());
        let media = classify_extracted(scratch.path(), &manifest, &self.classifier);
        debug!("classify"; "{} of {} manifest entries restored", media.copied, manifest.len());
        log!(
            "classify";
            "{} question, {} answer, {} reference mask{}",
            media.count(MediaRole::QuestionMask),
            media.count(MediaRole::AnswerMask),
            media.count(MediaRole::ReferenceOriginal),
            plural_s(media.count(MediaRole::ReferenceOriginal))
        );
        outcome.advance(ArchiveState::Classified);

        let artifacts = Compositor::new(self.rasterizer, self.config.convert.format, &out_dir)
            .run(&media);
        outcome.advance(ArchiveState::Composited);

        let published = publish(&artifacts, &self.config.paths.media);
        if !published.failed.is_empty() {
            log!("warning"; "{} not copied to the media folder", plural_count(published.failed.len(), "file"));
        }
        log!("publish"; "{} copied to {}", plural_count(published.copied.len(), "file"), self.config.paths.media.display());
        outcome.advance(ArchiveState::Published);

        outcome.artifacts = artifacts.iter().map(|a| a.file_name()).collect();
        if let Err(e) = report::write_image_paths(&out_dir, &name, &outcome.artifacts) {
            log!("error"; "cannot write {}: {}", report::IMAGE_PATHS_FILE, e);
        }
        if let Some((question, answer)) = published.qa_pair() {
            match report::write_qa_snippet(&out_dir, question, answer) {
                Ok(path) => {
                    report::open_in_editor(&path, &self.config.report.editor);
                    outcome.qa_snippet = Some(path);
                }
                Err(e) => log!("error"; "cannot write {}: {}", report::QA_SNIPPET_FILE, e),
            }
        }
        outcome.advance(ArchiveState::Reported);

        drop(scratch);
        outcome.advance(ArchiveState::Done);
        outcome
    }

    fn prepare(&self, out_dir: &Path) -> Result<bool> {
        prepare_output_dir(out_dir, |dir| match self.overwrite {
            Overwrite::Always => Ok(true),
            Overwrite::Never => Ok(false),
            Overwrite::Prompt => ask_overwrite(dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::composite::tests::FakeRasterizer;
    use crate::pipeline::intake::tests::write_zip;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: PipelineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut config = PipelineConfig::default();
            config.paths.input = dir.path().join("in");
            config.paths.output = dir.path().join("out");
            config.paths.media = dir.path().join("media");
            config.report.editor = Vec::new();
            fs::create_dir_all(&config.paths.input).unwrap();
            Self { _dir: dir, config }
        }

        fn archive(&self, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
            let path = self.config.paths.input.join(name);
            write_zip(&path, entries);
            path
        }

        fn out(&self, stem: &str) -> PathBuf {
            self.config.paths.output.join(stem)
        }
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255]))
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_full_run_question_and_answer() {
        let fx = Fixture::new();
        let base = png_bytes(800, 600);
        let archive = fx.archive(
            "heart.apkg",
            &[
                (
                    "media",
                    br#"{"0": "heart.png", "1": "heart-ques.svg", "2": "heart-ans.svg", "3": "heart-orig.svg"}"#,
                ),
                ("0", &base),
                ("1", b"<svg/>"),
                ("2", b"<svg/>"),
                ("3", b"<svg/>"),
            ],
        );

        let raster = FakeRasterizer { width: 400, height: 300 };
        let summary = Pipeline::new(&fx.config, &raster, Overwrite::Always).run(&[archive]);
        let outcome = &summary.outcomes[0];
        assert_eq!(outcome.state, ArchiveState::Done);

        let out = fx.out("heart");
        assert_eq!(
            image::image_dimensions(out.join("heart-ques_composite.png")).unwrap(),
            (800, 600)
        );
        assert!(out.join("heart-ans_composite.png").is_file());
        assert!(out.join("heart-orig.png").is_file());
        assert!(!out.join(SCRATCH_DIR).exists());

        let listing = fs::read_to_string(out.join(report::IMAGE_PATHS_FILE)).unwrap();
        assert_eq!(
            listing,
            "heart.png\nheart-ques_composite.png\nheart-ans_composite.png\nheart-orig.png\n"
        );

        let snippet = fs::read_to_string(out.join(report::QA_SNIPPET_FILE)).unwrap();
        assert!(snippet.contains("<img src=\"heart-ques_composite.png\""));
        assert!(snippet.contains("<img src=\"heart-ans_composite.png\""));

        let media = &fx.config.paths.media;
        for name in ["heart.png", "heart-ques_composite.png", "heart-ans_composite.png", "heart-orig.png"] {
            assert!(media.join(name).is_file(), "{name} not published");
        }
    }

    #[test]
    fn test_no_masks_no_snippet() {
        let fx = Fixture::new();
        let base = png_bytes(4, 4);
        let archive = fx.archive(
            "plain.apkg",
            &[("media", br#"{"0": "plain.png"}"#), ("0", &base)],
        );

        let raster = FakeRasterizer { width: 4, height: 4 };
        let outcome = Pipeline::new(&fx.config, &raster, Overwrite::Always).process(&archive);
        assert_eq!(outcome.state, ArchiveState::Done);
        assert_eq!(outcome.qa_snippet, None);

        let out = fx.out("plain");
        assert!(!out.join(report::QA_SNIPPET_FILE).exists());
        assert!(
            fs::read_dir(&out)
                .unwrap()
                .filter_map(|e| e.ok())
                .all(|e| !e.file_name().to_string_lossy().contains("_composite"))
        );
    }

    #[test]
    fn test_missing_manifest_reports_zero_results() {
        let fx = Fixture::new();
        let archive = fx.archive("empty.apkg", &[("0", b"orphan")]);

        let raster = FakeRasterizer { width: 4, height: 4 };
        let outcome = Pipeline::new(&fx.config, &raster, Overwrite::Always).process(&archive);
        assert_eq!(outcome.state, ArchiveState::Done);
        assert!(outcome.artifacts.is_empty());

        let listing = fs::read_to_string(fx.out("empty").join(report::IMAGE_PATHS_FILE)).unwrap();
        assert!(listing.contains("No images"));
    }

    #[test]
    fn test_corrupt_archive_does_not_stop_batch() {
        let fx = Fixture::new();
        let corrupt = fx.config.paths.input.join("broken.apkg");
        fs::write(&corrupt, b"PK but not really").unwrap();
        let base = png_bytes(4, 4);
        let good = fx.archive("good.apkg", &[("media", br#"{"0": "good.png"}"#), ("0", &base)]);

        let raster = FakeRasterizer { width: 4, height: 4 };
        let summary = Pipeline::new(&fx.config, &raster, Overwrite::Always).run(&[corrupt, good]);

        assert_eq!(summary.outcomes[0].state, ArchiveState::FailedExtraction);
        assert_eq!(summary.outcomes[1].state, ArchiveState::Done);
        assert!(!fx.out("broken").exists());
        assert!(fx.out("good").join(report::IMAGE_PATHS_FILE).is_file());
        assert_eq!(summary.count(ArchiveState::Done), 1);
    }

    #[test]
    fn test_existing_output_replaced_when_allowed() {
        let fx = Fixture::new();
        let base = png_bytes(4, 4);
        let archive = fx.archive("deck.apkg", &[("media", br#"{"0": "deck.png"}"#), ("0", &base)]);
        let stale = fx.out("deck").join("stale.png");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"").unwrap();

        let raster = FakeRasterizer { width: 4, height: 4 };
        let outcome = Pipeline::new(&fx.config, &raster, Overwrite::Always).process(&archive);
        assert_eq!(outcome.state, ArchiveState::Done);
        assert!(!stale.exists());
    }

    #[test]
    fn test_declined_overwrite_skips_and_batch_continues() {
        let fx = Fixture::new();
        let base = png_bytes(4, 4);
        let kept = fx.archive("kept.apkg", &[("media", br#"{"0": "kept.png"}"#), ("0", &base)]);
        let fresh = fx.archive("fresh.apkg", &[("media", br#"{"0": "fresh.png"}"#), ("0", &base)]);
        let old = fx.out("kept").join("old_composite.png");
        fs::create_dir_all(old.parent().unwrap()).unwrap();
        fs::write(&old, b"previous run").unwrap();

        let raster = FakeRasterizer { width: 4, height: 4 };
        let summary = Pipeline::new(&fx.config, &raster, Overwrite::Never).run(&[kept, fresh]);

        let states: Vec<_> = summary.outcomes.iter().map(|o| o.state).collect();
        assert_eq!(states, vec![ArchiveState::Skipped, ArchiveState::Done]);
        assert_eq!(fs::read(&old).unwrap(), b"previous run");
        assert!(!fx.out("kept").join(report::IMAGE_PATHS_FILE).exists());
        assert!(!fx.config.paths.media.join("kept.png").exists());
        assert!(fx.config.paths.media.join("fresh.png").is_file());
    }

    #[test]
    fn test_state_display_and_terminal() {
        assert!(ArchiveState::Done.is_terminal());
        assert!(ArchiveState::Skipped.is_terminal());
        assert!(!ArchiveState::Composited.is_terminal());
        assert_eq!(ArchiveState::FailedExtraction.to_string(), "extraction failed");
    }
}
