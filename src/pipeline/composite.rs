//! Mask rasterization and alpha compositing onto the base image.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, Rgba32FImage, RgbaImage};
use thiserror::Error;

use super::classify::{MediaItem, MediaRole, MediaSet};
use super::convert::Rasterize;
use crate::config::CompositeFormat;
use crate::log;
use crate::logger::ProgressLine;

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("no base image to composite onto")]
    NoBase,

    #[error("failed to read `{0}`")]
    Decode(PathBuf, #[source] image::ImageError),

    #[error("failed to write `{0}`")]
    Encode(PathBuf, #[source] image::ImageError),
}

/// Result of a successful composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composite {
    pub width: u32,
    pub height: u32,
    /// Whether the mask had to be stretched to the base's size.
    pub resized: bool,
}

/// Draw `mask` over `base`.
///
/// The mask is stretched to the base's exact dimensions when they differ;
/// the base is never resized. Resampling and blending both work on
/// premultiplied alpha, so transparent mask pixels carry no colour into
/// their neighbours.
pub fn compose(base: &DynamicImage, mask: &DynamicImage) -> (RgbaImage, bool) {
    let mut canvas = base.to_rgba8();
    let (width, height) = canvas.dimensions();

    let mask = premultiply(&mask.to_rgba8());
    let resized = mask.dimensions() != (width, height);
    let mask = if resized {
        imageops::resize(&mask, width, height, FilterType::Lanczos3)
    } else {
        mask
    };

    for (dst, src) in canvas.pixels_mut().zip(mask.pixels()) {
        *dst = over(*src, *dst);
    }
    (canvas, resized)
}

/// Straight 8-bit RGBA to premultiplied float RGBA in `0.0..=1.0`.
fn premultiply(image: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);
        Rgba([r * a, g * a, b * a, a])
    })
}

/// Porter-Duff "over" of a premultiplied `top` onto a straight `bottom`.
fn over(top: Rgba<f32>, bottom: Rgba<u8>) -> Rgba<u8> {
    // Lanczos rings past the valid range near hard edges
    let top_a = top[3].clamp(0.0, 1.0);
    let [br, bg, bb, ba] = bottom.0.map(|c| f32::from(c) / 255.0);
    let keep = 1.0 - top_a;

    let out_a = top_a + ba * keep;
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |top_c: f32, bottom_c: f32| {
        let premul = top_c.clamp(0.0, top_a) + bottom_c * ba * keep;
        to_u8(premul / out_a)
    };
    Rgba([
        channel(top[0], br),
        channel(top[1], bg),
        channel(top[2], bb),
        to_u8(out_a),
    ])
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Formats without an alpha channel.
fn is_opaque_format(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Jpeg)
}

/// Composite the mask PNG at `mask` over `base` and save to `out`.
///
/// The output format follows `out`'s extension.
pub fn composite_files(base: &Path, mask: &Path, out: &Path) -> Result<Composite, CompositeError> {
    let base_img = image::open(base).map_err(|e| CompositeError::Decode(base.to_path_buf(), e))?;
    let mask_img = image::open(mask).map_err(|e| CompositeError::Decode(mask.to_path_buf(), e))?;

    let (canvas, resized) = compose(&base_img, &mask_img);
    let (width, height) = canvas.dimensions();

    let encode = |e| CompositeError::Encode(out.to_path_buf(), e);
    let format = ImageFormat::from_path(out).map_err(encode)?;
    if is_opaque_format(format) {
        DynamicImage::ImageRgba8(canvas)
            .to_rgb8()
            .save_with_format(out, format)
            .map_err(encode)?;
    } else {
        canvas.save_with_format(out, format).map_err(encode)?;
    }

    Ok(Composite {
        width,
        height,
        resized,
    })
}

// ============================================================================
// Stage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    BaseImage,
    QuestionComposite,
    AnswerComposite,
    Reference,
    /// Rasterized mask kept after compositing failed.
    Fallback,
}

/// A file destined for the Anki media folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    fn new(path: PathBuf, kind: ArtifactKind) -> Self {
        Self { path, kind }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Rasterizes masks and composites them for one archive.
pub struct Compositor<'a> {
    rasterizer: &'a dyn Rasterize,
    format: CompositeFormat,
    out_dir: &'a Path,
}

impl<'a> Compositor<'a> {
    pub fn new(rasterizer: &'a dyn Rasterize, format: CompositeFormat, out_dir: &'a Path) -> Self {
        Self {
            rasterizer,
            format,
            out_dir,
        }
    }

    /// Produce every artifact for `media`: the base image, one composite per
    /// question/answer mask and one conversion per reference original.
    ///
    /// Failures only affect the mask they happen on.
    pub fn run(&self, media: &MediaSet) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        let base = media.base_image();
        if let Some(base) = base {
            artifacts.push(Artifact::new(base.path.clone(), ArtifactKind::BaseImage));
        }

        let progress = ProgressLine::new(
            "convert",
            &[
                ("question", media.count(MediaRole::QuestionMask)),
                ("answer", media.count(MediaRole::AnswerMask)),
                ("reference", media.count(MediaRole::ReferenceOriginal)),
            ],
        );

        for (role, label, kind) in [
            (MediaRole::QuestionMask, "question", ArtifactKind::QuestionComposite),
            (MediaRole::AnswerMask, "answer", ArtifactKind::AnswerComposite),
        ] {
            for mask in media.with_role(role) {
                if let Some(artifact) = self.composite_mask(mask, base, kind) {
                    artifacts.push(artifact);
                }
                progress.inc(label);
            }
        }

        for reference in media.with_role(MediaRole::ReferenceOriginal) {
            let png = self.out_dir.join(format!("{}.png", reference.stem()));
            match self.rasterizer.rasterize(&reference.path, &png) {
                Ok(()) => artifacts.push(Artifact::new(png, ArtifactKind::Reference)),
                Err(e) => log!("error"; "{}: {}", reference.name, e),
            }
            progress.inc("reference");
        }

        progress.finish();
        artifacts
    }

    fn composite_mask(
        &self,
        mask: &MediaItem,
        base: Option<&MediaItem>,
        kind: ArtifactKind,
    ) -> Option<Artifact> {
        let stem = mask.stem();
        let raster = self.out_dir.join(format!("{stem}_raster.png"));

        if let Err(e) = self.rasterizer.rasterize(&mask.path, &raster) {
            log!("error"; "{}: {}", mask.name, e);
            return None;
        }

        let out = self
            .out_dir
            .join(format!("{stem}_composite.{}", self.format.extension()));
        let result = match base {
            Some(base) => composite_files(&base.path, &raster, &out),
            None => Err(CompositeError::NoBase),
        };

        match result {
            Ok(composite) => {
                crate::debug!(
                    "composite";
                    "{} {}x{}{}",
                    out.display(),
                    composite.width,
                    composite.height,
                    if composite.resized { " (mask resized)" } else { "" }
                );
                if let Err(e) = fs::remove_file(&raster) {
                    log!("warning"; "cannot remove {}: {}", raster.display(), e);
                }
                Some(Artifact::new(out, kind))
            }
            Err(e) => {
                log!("error"; "{}: {:#}, keeping rasterized mask", mask.name, anyhow::Error::from(e));
                let _ = fs::remove_file(&out);
                let fallback = self.out_dir.join(format!("{stem}.png"));
                match fs::rename(&raster, &fallback) {
                    Ok(()) => Some(Artifact::new(fallback, ArtifactKind::Fallback)),
                    Err(_) => Some(Artifact::new(raster, ArtifactKind::Fallback)),
                }
            }
        }
    }
}
