//! Image listing and example sampling.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::classifier::{Label, TrainingSet};
use crate::error::{Error, Result};
use crate::hog::{compute_descriptor, window_fits, CellGrid, FeatureMap, HogConfig};
use crate::window::{WIN_HEIGHT, WIN_WIDTH, WIN_WIDTH_CELL};

/// Accepted image file extensions, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "bmp", "jpeg"];

/// `true` if `path` has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Image files in `dir`, sorted by path.
pub fn list_images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_images(dir, recursive, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_images(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_dir() {
            if recursive {
                collect_images(&path, true, out)?;
            }
        } else if is_image_file(&path) {
            out.push(path);
        }
    }
    Ok(())
}

/// Decode any supported image as RGB8.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| Error::image(path, e))?;
    Ok(img.to_rgb8())
}

/// Decode every image of `dir`, skipping unreadable ones with a warning.
///
/// A missing directory yields no image.
pub fn load_dir(dir: &Path) -> Vec<RgbImage> {
    let paths = match list_images(dir, true) {
        Ok(paths) => paths,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "cannot list images");
            return Vec::new();
        }
    };
    let mut images = Vec::with_capacity(paths.len());
    for (i, path) in paths.iter().enumerate() {
        tracing::debug!(index = i, total = paths.len(), path = %path.display(), "loading");
        match load_image(path) {
            Ok(img) => images.push(img),
            Err(err) => tracing::warn!(error = %err, "skipping image"),
        }
    }
    images
}

/// Descriptor of the top-left window of `image`, or `None` if the window does not fit.
pub fn window_descriptor(
    image: &RgbImage,
    hog: &HogConfig,
    features: &FeatureMap,
) -> Result<Option<Vec<f64>>> {
    let grid = CellGrid::from_image(image, hog);
    if !window_fits(&grid, 0) {
        return Ok(None);
    }
    compute_descriptor(&grid, 0, features).map(Some)
}

/// Random `WIN_WIDTH x WIN_HEIGHT` crop of `image`, `None` if it is smaller.
pub fn random_crop(image: &RgbImage, rng: &mut impl rand::Rng) -> Option<RgbImage> {
    let (w, h) = image.dimensions();
    let (ww, wh) = (WIN_WIDTH as u32, WIN_HEIGHT as u32);
    if w < ww || h < wh {
        return None;
    }
    let x = rng.gen_range(0..=w - ww);
    let y = rng.gen_range(0..=h - wh);
    Some(image::imageops::crop_imm(image, x, y, ww, wh).to_image())
}

/// `WIN_WIDTH x WIN_HEIGHT` crop at pixel column `x`, anchored at the top.
pub fn window_crop(image: &RgbImage, x: u32) -> RgbImage {
    image::imageops::crop_imm(image, x, 0, WIN_WIDTH as u32, WIN_HEIGHT as u32).to_image()
}

/// Full-width `WIN_HEIGHT`-tall strips cut every `step` rows.
pub fn background_strips(images: &[RgbImage], step: usize) -> Vec<RgbImage> {
    let wh = WIN_HEIGHT as u32;
    let mut strips = Vec::new();
    for image in images {
        let (w, h) = image.dimensions();
        if h < wh {
            continue;
        }
        for y in (0..=h - wh).step_by(step.max(1)) {
            strips.push(image::imageops::crop_imm(image, 0, y, w, wh).to_image());
        }
    }
    strips
}

/// One positive example per image: the window at cell offset 0.
pub fn sample_positives(images: &[RgbImage], hog: &HogConfig, features: &FeatureMap) -> Result<TrainingSet> {
    let mut set = TrainingSet::new();
    for image in images {
        match window_descriptor(image, hog, features)? {
            Some(d) => set.push(d, Label::Positive),
            None => tracing::warn!(
                width = image.width(),
                height = image.height(),
                "positive image too small for a window"
            ),
        }
    }
    Ok(set)
}

/// `per_image` negative examples from every background image.
///
/// Images no wider than `WIN_WIDTH * per_image` are used whole at a random
/// valid cell offset; wider ones contribute random window crops.
pub fn sample_negatives(
    images: &[RgbImage],
    per_image: usize,
    hog: &HogConfig,
    features: &FeatureMap,
    rng: &mut impl rand::Rng,
) -> Result<TrainingSet> {
    let mut set = TrainingSet::new();
    for image in images {
        if image.width() as usize <= WIN_WIDTH * per_image {
            let grid = CellGrid::from_image(image, hog);
            if !window_fits(&grid, 0) {
                tracing::warn!(
                    width = image.width(),
                    height = image.height(),
                    "negative image too small for a window"
                );
                continue;
            }
            let max_offset = grid.cols() - WIN_WIDTH_CELL;
            for _ in 0..per_image {
                let offset = rng.gen_range(0..=max_offset);
                set.push(compute_descriptor(&grid, offset, features)?, Label::Negative);
            }
        } else {
            for _ in 0..per_image {
                let Some(crop) = random_crop(image, rng) else {
                    tracing::warn!(
                        width = image.width(),
                        height = image.height(),
                        "negative image too small for a window"
                    );
                    break;
                };
                if let Some(d) = window_descriptor(&crop, hog, features)? {
                    set.push(d, Label::Negative);
                }
            }
        }
    }
    Ok(set)
}
